//! The submission-to-commit pipeline.
//!
//! One run takes an accepted submission from a [`ProblemSource`], decides
//! which files the archive repository needs, lands them in a single commit
//! through [`RemoteRepo`] and only then persists the advanced ledger to the
//! [`Store`]. The ledger is never written before the commit is confirmed,
//! so local bookkeeping cannot run ahead of the repository and a failed run
//! leaves no trace. A failed run is not resumable; the caller restarts it
//! from scratch with a freshly read ledger.
//!
//! One run at a time is the intended usage. Nothing here locks against an
//! overlapping run: two racing runs read the same base tree and the slower
//! one fails at the ref-update step, which is surfaced, not retried.
//!
//! Per-problem idempotence rules:
//! - the problem statement is committed once and never rewritten,
//! - notes and the solution file are rewritten on every accepted run,
//! - the root README is folded through the topic index and only committed
//!   when that actually changed it,
//! - the stats file only accompanies the first archive of a problem.

use tracing::{debug, error, info};

use crate::contract::{
    repo_path, FileChange, ProblemSource, PutFile, RemoteRepo, Store, Submission,
};
use crate::detect::{await_accepted, PollConfig};
use crate::error::{MissingField, RepoError, SyncError};
use crate::readme::{append_problem_to_readme, sort_topics_in_readme, DEFAULT_REPO_README};
use crate::stats::{Difficulty, PlatformStats, StatsLedger};
use crate::store;

pub const STATEMENT_FILENAME: &str = "README.md";
pub const NOTES_FILENAME: &str = "NOTES.md";
pub const STATS_FILENAME: &str = "stats.json";

/// Phases of a single run. Every phase can fail; failures are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Validating,
    BuildingFiles,
    Committing,
    Persisting,
    Done,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveReport {
    /// Sha of the created commit, `None` when there was nothing to commit.
    pub commit_sha: Option<String>,
    pub files_committed: Vec<String>,
    /// The ledger as persisted at the end of the run.
    pub ledger: StatsLedger,
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Assemble and validate the submission before any remote call is made.
fn validate<P: ProblemSource + ?Sized>(source: &P) -> Result<Submission, SyncError> {
    let stats = source
        .stats()
        .and_then(non_empty)
        .ok_or(SyncError::MissingSubmissionData(MissingField::Stats))?;
    let question = source
        .question()
        .and_then(non_empty)
        .ok_or(SyncError::MissingSubmissionData(MissingField::Statement))?;
    let extension = source
        .language_extension()
        .ok_or(SyncError::MissingSubmissionData(MissingField::Language))?;
    let code = source
        .code()
        .and_then(non_empty)
        .ok_or(SyncError::MissingSubmissionData(MissingField::Code))?;

    let raw_difficulty = source.difficulty().unwrap_or_default();
    let difficulty = Difficulty::parse(&raw_difficulty)
        .ok_or_else(|| SyncError::UnknownDifficulty(raw_difficulty.clone()))?;

    Ok(Submission {
        slug: source.slug(),
        question,
        code,
        extension,
        difficulty,
        topic_tags: source.topic_tags(),
        notes: source.notes().and_then(non_empty),
        stats,
        submission_id: source.submission_id(),
    })
}

fn commit_message(submission: &Submission) -> String {
    format!("{} - {}", submission.slug.to_uppercase(), submission.stats)
}

struct FilePlan {
    files: Vec<FileChange>,
    /// Ledger with the speculative count for this run already applied.
    ledger: StatsLedger,
    statement_included: bool,
}

/// Decide the batch for this submission against the current ledger.
/// `root_readme` is the current root README text when topic folding is
/// wanted (tags present), already defaulted by the caller on a 404.
fn plan_files(
    submission: &Submission,
    ledger: &StatsLedger,
    hook: &str,
    root_readme: Option<&str>,
) -> FilePlan {
    let slug = &submission.slug;
    let mut speculative = ledger.clone();
    let mut files = Vec::new();

    let statement_included = !ledger.has_statement(slug);
    if statement_included {
        files.push(FileChange {
            path: repo_path(slug, Some(STATEMENT_FILENAME)),
            content: submission.question.clone(),
        });
    }

    if let Some(notes) = &submission.notes {
        files.push(FileChange {
            path: repo_path(slug, Some(NOTES_FILENAME)),
            content: notes.clone(),
        });
    }

    files.push(FileChange {
        path: format!("{slug}{}", submission.extension),
        content: submission.code.clone(),
    });

    if let Some(current) = root_readme {
        let mut updated = current.to_owned();
        for tag in &submission.topic_tags {
            updated = append_problem_to_readme(tag, &updated, hook, slug);
        }
        let updated = sort_topics_in_readme(&updated);
        if updated != current {
            files.push(FileChange {
                path: STATEMENT_FILENAME.to_owned(),
                content: updated,
            });
        } else {
            debug!(slug = %slug, "root README already lists this problem");
        }
    }

    if !ledger.is_archived(slug) {
        speculative.record_solved(slug, submission.difficulty);
        let envelope = PlatformStats {
            leetcode: speculative.clone(),
        };
        files.push(FileChange {
            path: STATS_FILENAME.to_owned(),
            content: serde_json::to_string_pretty(&envelope)
                .expect("stats envelope serializes to JSON"),
        });
    }

    FilePlan {
        files,
        ledger: speculative,
        statement_included,
    }
}

/// Run the whole pipeline for one accepted submission.
pub async fn archive_accepted_submission<R, S, P>(
    repo: &R,
    store: &S,
    source: &P,
) -> Result<ArchiveReport, SyncError>
where
    R: RemoteRepo + ?Sized,
    S: Store + ?Sized,
    P: ProblemSource + ?Sized,
{
    debug!(phase = ?RunPhase::Idle, "run starting");
    let creds = store::load_credentials(store).await?;
    let ledger = store::load_ledger(store).await?;

    debug!(phase = ?RunPhase::Validating, "validating submission");
    let submission = validate(source)?;
    info!(
        slug = %submission.slug,
        difficulty = ?submission.difficulty,
        "validated accepted submission"
    );

    debug!(phase = ?RunPhase::BuildingFiles, "building file batch");
    let root_readme = if submission.topic_tags.is_empty() {
        None
    } else {
        match repo.get_file(&creds, STATEMENT_FILENAME).await {
            Ok(file) => Some(file.text),
            Err(RepoError::NotFound { .. }) => {
                info!("no root README yet; starting from the default");
                Some(DEFAULT_REPO_README.to_owned())
            }
            Err(err) => return Err(err.into()),
        }
    };
    let mut plan = plan_files(&submission, &ledger, &creds.hook, root_readme.as_deref());

    if plan.files.is_empty() {
        info!(slug = %submission.slug, "nothing to commit");
        return Ok(ArchiveReport {
            commit_sha: None,
            files_committed: Vec::new(),
            ledger,
        });
    }

    debug!(phase = ?RunPhase::Committing, "committing batch");
    let message = commit_message(&submission);
    let paths: Vec<String> = plan.files.iter().map(|f| f.path.clone()).collect();
    let commit_sha = repo
        .commit_batch(&creds, &plan.files, &message)
        .await
        .map_err(|err| {
            error!(slug = %submission.slug, error = %err, "batch commit failed");
            err
        })?;

    debug!(phase = ?RunPhase::Persisting, "persisting ledger");
    plan.ledger
        .confirm_commit(&submission.slug, &commit_sha, plan.statement_included);
    store::save_ledger(store, &plan.ledger).await?;

    debug!(phase = ?RunPhase::Done, "run finished");
    info!(
        slug = %submission.slug,
        commit = %commit_sha,
        files = paths.len(),
        solved = plan.ledger.solved,
        "archived accepted submission"
    );
    Ok(ArchiveReport {
        commit_sha: Some(commit_sha),
        files_committed: paths,
        ledger: plan.ledger,
    })
}

/// Wait for the page to report an accepted submission, then archive it.
pub async fn detect_and_archive<R, S, P>(
    repo: &R,
    store: &S,
    source: &P,
    poll: &PollConfig,
) -> Result<ArchiveReport, SyncError>
where
    R: RemoteRepo + ?Sized,
    S: Store + ?Sized,
    P: ProblemSource + ?Sized,
{
    await_accepted(source, poll).await?;
    archive_accepted_submission(repo, store, source).await
}

/// Out-of-band append used when the user creates a discussion post for an
/// archived problem: the dated link is prepended to that problem's README
/// through the single-file path, not the batch path.
pub async fn prepend_discussion_post<R, S>(
    repo: &R,
    store: &S,
    slug: &str,
    post_url: &str,
    created_on: &str,
) -> Result<String, SyncError>
where
    R: RemoteRepo + ?Sized,
    S: Store + ?Sized,
{
    let creds = store::load_credentials(store).await?;
    let path = repo_path(slug, Some(STATEMENT_FILENAME));
    let existing = repo.get_file(&creds, &path).await?;
    let content = format!(
        "[Discussion Post (created on {created_on})]({post_url})  \n{}",
        existing.text
    );
    let sha = repo
        .put_file(
            &creds,
            PutFile {
                path: &path,
                message: "Prepend discussion post - LeetHub",
                content: &content,
                sha: Some(&existing.sha),
            },
        )
        .await?;
    info!(slug, "prepended discussion post link");
    Ok(sha)
}

//! Repository linking and account workflows.
//!
//! These back the welcome surface of the extension: pointing the hook at an
//! existing repository, creating a fresh one, tearing the link down again,
//! recording a freshly authorized user and pulling persisted stats out of
//! the repository the first time it is linked.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::archive::STATS_FILENAME;
use crate::contract::{NewRepository, RemoteRepo, RepoCredentials, RepoInfo, Store};
use crate::error::{RepoError, SyncError};
use crate::stats::{PlatformStats, StatsLedger};
use crate::store::{self, keys, MODE_COMMIT, MODE_HOOK};

/// Description attached to repositories this crate creates.
pub const REPO_DESCRIPTION: &str = "A collection of LeetCode questions to ace the coding interviews! - Created using LeetHub";

/// Operator-facing explanation for a failed repository creation.
pub fn create_error_message(status: u16, name: &str) -> String {
    match status {
        304 => format!("Error creating {name} - Unable to modify repository. Try again later!"),
        400 => format!("Error creating {name} - Bad POST request, make sure you're not overriding any existing scripts"),
        401 => format!("Error creating {name} - Unauthorized access to repo. Try again later!"),
        403 => format!("Error creating {name} - Forbidden access to repository. Try again later!"),
        422 => format!("Error creating {name} - Unprocessable Entity. Repository may have already been created. Try linking instead."),
        other => format!("Error creating {name} - received status {other}"),
    }
}

/// Operator-facing explanation for a failed link attempt.
pub fn link_error_message(status: u16, name: &str) -> String {
    match status {
        301 => format!("Error linking {name} to LeetHub. This repository has been moved permanently. Try creating a new one."),
        403 => format!("Error linking {name} to LeetHub. Forbidden action. Please make sure you have the right access to this repository."),
        404 => format!("Error linking {name} to LeetHub. Resource not found. Make sure you enter the right repository name."),
        other => format!("Error linking {name} to LeetHub - received status {other}"),
    }
}

/// Link the hook to an existing repository after verifying the token can
/// reach it. A failed verification resets the link to hook mode so the
/// pipeline's preconditions keep refusing to commit.
pub async fn link_repository<R, S>(
    repo: &R,
    store: &S,
    full_name: &str,
) -> Result<RepoInfo, SyncError>
where
    R: RemoteRepo + ?Sized,
    S: Store + ?Sized,
{
    let token = store::load_token(store).await?;
    let creds = RepoCredentials {
        token,
        hook: full_name.to_owned(),
    };
    match repo.repository(&creds, full_name).await {
        Ok(found) => {
            store.set(keys::MODE, json!(MODE_COMMIT)).await?;
            store.set(keys::HOOK, json!(found.full_name)).await?;
            info!(repo = %found.full_name, "linked repository");
            Ok(found)
        }
        Err(err) => {
            if let RepoError::Status { status } = &err {
                warn!(status, "{}", link_error_message(*status, full_name));
            }
            store.set(keys::MODE, json!(MODE_HOOK)).await?;
            store.set(keys::HOOK, Value::Null).await?;
            Err(err.into())
        }
    }
}

/// Create a private, auto-initialised archive repository and link it. Stale
/// stats from a previously linked repository are dropped.
pub async fn create_repository_and_link<R, S>(
    repo: &R,
    store: &S,
    name: &str,
) -> Result<RepoInfo, SyncError>
where
    R: RemoteRepo + ?Sized,
    S: Store + ?Sized,
{
    let token = store::load_token(store).await?;
    let creds = RepoCredentials {
        token,
        hook: String::new(),
    };
    let created = repo
        .create_repository(
            &creds,
            NewRepository {
                name,
                description: REPO_DESCRIPTION,
            },
        )
        .await
        .map_err(|err| {
            if let RepoError::Status { status } = &err {
                warn!(status, "{}", create_error_message(*status, name));
            }
            SyncError::from(err)
        })?;

    store.set(keys::MODE, json!(MODE_COMMIT)).await?;
    store.set(keys::HOOK, json!(created.full_name)).await?;
    store.remove(keys::STATS).await?;
    info!(repo = %created.full_name, "created and linked repository");
    Ok(created)
}

/// Tear the link down: back to hook mode, no repository, no cached stats,
/// and the next link pulls persistent stats again.
pub async fn unlink_repository<S: Store + ?Sized>(store: &S) -> Result<(), SyncError> {
    store.set(keys::MODE, json!(MODE_HOOK)).await?;
    store.set(keys::HOOK, Value::Null).await?;
    store.set(keys::SYNC_STATS, json!(true)).await?;
    store.remove(keys::STATS).await?;
    info!("unlinked repository and cleared local stats");
    Ok(())
}

/// Validate a freshly acquired token by resolving its owner, then persist
/// both. The OAuth redirect dance itself happens in the embedder.
pub async fn record_authentication<R, S>(
    repo: &R,
    store: &S,
    token: &str,
) -> Result<String, SyncError>
where
    R: RemoteRepo + ?Sized,
    S: Store + ?Sized,
{
    let creds = RepoCredentials {
        token: token.to_owned(),
        hook: String::new(),
    };
    let username = repo.authenticated_user(&creds).await?;
    store.set(keys::TOKEN, json!(token)).await?;
    store.set(keys::USERNAME, json!(username)).await?;
    info!(username = %username, "recorded authenticated user");
    Ok(username)
}

/// One-shot pull of the persistent stats from the linked repository into
/// the local store. Subsequent calls are no-ops until the link changes.
pub async fn sync_remote_stats<R, S>(repo: &R, store: &S) -> Result<StatsLedger, SyncError>
where
    R: RemoteRepo + ?Sized,
    S: Store + ?Sized,
{
    if store.get(keys::SYNC_STATS).await? == Some(json!(false)) {
        debug!("persistent stats already synced");
        return store::load_ledger(store).await;
    }

    let creds = store::load_credentials(store).await?;
    let ledger = match repo.get_file(&creds, STATS_FILENAME).await {
        Ok(file) => {
            let envelope: PlatformStats = serde_json::from_str(&file.text)
                .map_err(|e| RepoError::Malformed(format!("remote stats file: {e}")))?;
            envelope.leetcode
        }
        Err(RepoError::NotFound { .. }) => {
            info!("no remote stats found; starting fresh");
            StatsLedger::default()
        }
        Err(err) => return Err(err.into()),
    };

    store::save_ledger(store, &ledger).await?;
    store.set(keys::SYNC_STATS, json!(false)).await?;
    info!(solved = ledger.solved, "synced stats from repository");
    Ok(ledger)
}

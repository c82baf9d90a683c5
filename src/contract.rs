//! # contract: capability interfaces between the pipeline and its embedder
//!
//! This module defines the three traits the pipeline depends on, plus the
//! plain data types flowing through them:
//!
//! - [`Store`]: the opaque asynchronous key-value storage of the embedding
//!   browser extension (credentials, repository pointer, cached stats).
//! - [`ProblemSource`]: extraction of an accepted submission from a page or
//!   session handle. Two conforming implementations live in
//!   [`crate::extract`], one per supported site version; the embedder picks
//!   one by configuration rather than by runtime feature-sniffing.
//! - [`RemoteRepo`]: the hosting provider's content and Git-data endpoints,
//!   implemented for real by [`crate::github::GitHubClient`].
//!
//! All traits are annotated for `mockall` so consumers can generate
//! deterministic mocks for unit/integration tests (enabled by the
//! `test-export-mocks` feature, on by default).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::{RepoError, StoreError};
use crate::stats::Difficulty;

/// Token plus `owner/repo` pointer for the linked repository. Constructed
/// once at the orchestrator entry point and passed to every client call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCredentials {
    pub token: String,
    /// `owner/repo` pointer to the linked target repository.
    pub hook: String,
}

/// A file read back from the repository, already decoded to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    pub text: String,
    /// Blob sha, required when updating the same path via the contents API.
    pub sha: String,
}

/// One file in an atomic batch commit. Content is UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub content: String,
}

/// Single-file create/update request for the contents API.
pub struct PutFile<'a> {
    pub path: &'a str,
    pub message: &'a str,
    pub content: &'a str,
    /// Current blob sha; required when the path already exists.
    pub sha: Option<&'a str>,
}

/// Request to create a fresh archive repository under the user's account.
pub struct NewRepository<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

/// Repository metadata returned by the management endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    pub html_url: String,
}

/// An accepted submission, assembled from a [`ProblemSource`] during
/// validation and consumed once by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub slug: String,
    /// Problem statement text, committed once per problem.
    pub question: String,
    /// The accepted solution body, rewritten on every run.
    pub code: String,
    /// Resolved file extension including the leading dot, e.g. `.py`.
    pub extension: String,
    pub difficulty: Difficulty,
    pub topic_tags: Vec<String>,
    pub notes: Option<String>,
    /// Raw runtime/memory stats text, also used in the commit message.
    pub stats: String,
    pub submission_id: Option<u64>,
}

/// Repository path for a problem file; root-level files carry no directory
/// prefix.
pub fn repo_path(dir: &str, filename: Option<&str>) -> String {
    match filename {
        Some(name) => format!("{dir}/{name}"),
        None => dir.to_owned(),
    }
}

/// Opaque asynchronous key-value storage owned by the embedding extension.
/// Values are JSON; absent keys read back as `None`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Extraction capability over a page or session handle. The getters return
/// whatever the page currently holds; validation of completeness is the
/// pipeline's job, not the extractor's.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ProblemSource: Send + Sync {
    /// Whether the page currently shows an accepted submission. Polled by
    /// the detection loop.
    async fn accepted(&self) -> bool;

    fn slug(&self) -> String;

    fn stats(&self) -> Option<String>;

    fn question(&self) -> Option<String>;

    fn code(&self) -> Option<String>;

    /// Resolved file extension for the submission language, if the language
    /// is known.
    fn language_extension(&self) -> Option<String>;

    fn difficulty(&self) -> Option<String>;

    fn topic_tags(&self) -> Vec<String>;

    fn notes(&self) -> Option<String>;

    fn submission_id(&self) -> Option<u64>;
}

/// The hosting provider's content and Git-data endpoints. Implementors are
/// responsible for transport, authentication headers and wire encoding;
/// callers always supply [`RepoCredentials`] explicitly.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteRepo: Send + Sync {
    /// Read a single file. Fails with [`RepoError::NotFound`] when the path
    /// does not exist; callers decide whether that is an error.
    async fn get_file(&self, creds: &RepoCredentials, path: &str) -> Result<RepoFile, RepoError>;

    /// Create or update a single file outside the batch path. Returns the
    /// new blob sha.
    async fn put_file<'a>(
        &self,
        creds: &RepoCredentials,
        req: PutFile<'a>,
    ) -> Result<String, RepoError>;

    /// Commit all files in one atomic operation against the `main` branch.
    /// Returns the new commit sha. A failure at any step leaves the visible
    /// history of the repository unchanged.
    async fn commit_batch(
        &self,
        creds: &RepoCredentials,
        files: &[FileChange],
        message: &str,
    ) -> Result<String, RepoError>;

    /// Login name of the token's owner. Used to validate a fresh token.
    async fn authenticated_user(&self, creds: &RepoCredentials) -> Result<String, RepoError>;

    /// Metadata for an existing repository the token can access.
    async fn repository(
        &self,
        creds: &RepoCredentials,
        full_name: &str,
    ) -> Result<RepoInfo, RepoError>;

    /// Create a private, auto-initialised repository under the user.
    async fn create_repository<'a>(
        &self,
        creds: &RepoCredentials,
        req: NewRepository<'a>,
    ) -> Result<RepoInfo, RepoError>;
}

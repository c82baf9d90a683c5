//! Error kinds surfaced by the pipeline and its capabilities.

use std::fmt;

use thiserror::Error;

/// Error raised by the opaque key-value store capability. The storage
/// engine lives with the embedder, so only a reason string crosses the
/// boundary.
#[derive(Debug, Error)]
#[error("store operation failed: {reason}")]
pub struct StoreError {
    pub reason: String,
}

impl StoreError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Which required submission field was absent or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Stats,
    Statement,
    Language,
    Code,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingField::Stats => "submission stats",
            MissingField::Statement => "problem statement",
            MissingField::Language => "language extension",
            MissingField::Code => "solution code",
        };
        f.write_str(name)
    }
}

/// Failures talking to the hosting provider.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The requested path does not exist (HTTP 404 on a file read). File
    /// readers treat this as "absent", not as a hard failure.
    #[error("{path} does not exist in the repository")]
    NotFound { path: String },

    /// Any other non-2xx response.
    #[error("remote returned status {status}")]
    Status { status: u16 },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response arrived but its payload could not be interpreted.
    #[error("malformed remote payload: {0}")]
    Malformed(String),
}

/// Everything a pipeline run can fail with. Validation kinds are raised
/// before any remote call is made.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no access token is stored; authenticate first")]
    NotAuthenticated,

    #[error("no repository is linked")]
    NoRepoLinked,

    #[error("repository is linked for stats only; commit mode is required")]
    WrongMode,

    #[error("submission is missing its {0}")]
    MissingSubmissionData(MissingField),

    #[error("unknown difficulty {0:?}")]
    UnknownDifficulty(String),

    #[error("no accepted submission detected after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error(transparent)]
    Remote(#[from] RepoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

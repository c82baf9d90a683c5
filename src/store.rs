//! Typed access to the persisted extension state.
//!
//! The [`Store`] capability is a bag of JSON values owned by the embedder;
//! this module is the only place where those loose values are mapped to the
//! rich types the pipeline works with, and where absent or malformed values
//! turn into the distinct precondition errors.

use serde_json::Value;
use tracing::debug;

use crate::contract::{RepoCredentials, Store};
use crate::error::{StoreError, SyncError};
use crate::stats::StatsLedger;

/// Keys used in the embedder's storage.
pub mod keys {
    pub const TOKEN: &str = "leethub_token";
    pub const HOOK: &str = "leethub_hook";
    pub const MODE: &str = "mode_type";
    pub const STATS: &str = "stats";
    pub const USERNAME: &str = "leethub_username";
    pub const SYNC_STATS: &str = "sync_stats";
}

/// The linked repository receives commits.
pub const MODE_COMMIT: &str = "commit";
/// A repository pointer exists but only stats are tracked.
pub const MODE_HOOK: &str = "hook";

async fn get_string<S: Store + ?Sized>(store: &S, key: &str) -> Result<Option<String>, StoreError> {
    Ok(store
        .get(key)
        .await?
        .and_then(|value| value.as_str().map(str::to_owned)))
}

/// Read the access token, failing when none is stored.
pub async fn load_token<S: Store + ?Sized>(store: &S) -> Result<String, SyncError> {
    get_string(store, keys::TOKEN)
        .await?
        .filter(|token| !token.is_empty())
        .ok_or(SyncError::NotAuthenticated)
}

/// Check every pipeline precondition and assemble the credentials: a token
/// must be stored, the link mode must be `commit` and a repository pointer
/// must exist. Each violation has its own error kind and nothing is
/// mutated.
pub async fn load_credentials<S: Store + ?Sized>(store: &S) -> Result<RepoCredentials, SyncError> {
    let token = load_token(store).await?;
    let mode = get_string(store, keys::MODE).await?;
    if mode.as_deref() != Some(MODE_COMMIT) {
        return Err(SyncError::WrongMode);
    }
    let hook = get_string(store, keys::HOOK)
        .await?
        .filter(|hook| !hook.is_empty())
        .ok_or(SyncError::NoRepoLinked)?;
    Ok(RepoCredentials { token, hook })
}

/// Read the cached ledger, starting fresh when none is stored yet.
pub async fn load_ledger<S: Store + ?Sized>(store: &S) -> Result<StatsLedger, SyncError> {
    match store.get(keys::STATS).await? {
        Some(value) if !value.is_null() => {
            let ledger: StatsLedger = serde_json::from_value(value)
                .map_err(|e| StoreError::new(format!("stored stats are malformed: {e}")))?;
            debug!(solved = ledger.solved, "loaded cached ledger");
            Ok(ledger)
        }
        _ => {
            debug!("no cached ledger; starting fresh");
            Ok(StatsLedger::default())
        }
    }
}

/// Persist the whole ledger as one operation.
pub async fn save_ledger<S: Store + ?Sized>(
    store: &S,
    ledger: &StatsLedger,
) -> Result<(), SyncError> {
    let value: Value = serde_json::to_value(ledger)
        .map_err(|e| StoreError::new(format!("ledger failed to encode: {e}")))?;
    store.set(keys::STATS, value).await?;
    Ok(())
}

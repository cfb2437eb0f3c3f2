use thiserror::Error;

use crate::validation::UserIdError;

/// Errors raised by a [`ProgressStore`](crate::progress::storage::ProgressStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Backend is reachable in principle but refused the call (timeouts, outages).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Internal error (task join errors, poisoned locks)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors surfaced by the progression engine to its callers.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// Reading or writing progress failed. Prior cached state is left untouched.
    #[error("progress store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The module id is not part of the catalog. This is a caller bug.
    #[error("unknown module id: {0}")]
    InvalidModuleId(String),

    /// The module's predecessor has not been passed yet.
    #[error("module {0} is locked")]
    ModuleLocked(String),

    /// Anonymous sessions cannot record progress.
    #[error("cannot record progress without a signed-in user")]
    UnauthenticatedWrite,

    /// Scores are percentages in 0..=100.
    #[error("score {0} out of range (expected 0-100)")]
    InvalidScore(u32),

    #[error("invalid user id: {0}")]
    InvalidUserId(#[from] UserIdError),

    /// Catalog definitions violate ordering or uniqueness rules.
    #[error("invalid module catalog: {0}")]
    InvalidCatalog(String),
}

impl ProgressError {
    /// Only store failures are worth retrying; everything else needs a code or input fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProgressError::StoreUnavailable(_))
    }
}

use shapemap_store::StoreError;
use thiserror::Error;

/// Errors produced while computing change sets.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("invalid predicate {predicate}: {reason}")]
    InvalidPredicate { predicate: String, reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

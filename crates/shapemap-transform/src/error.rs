use shapemap_context::ContextError;
use shapemap_store::StoreError;
use thiserror::Error;

/// Errors produced while mapping data to statements.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("invalid predicate {predicate}: {reason}")]
    InvalidPredicate { predicate: String, reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias for transform results.
pub type TransformResult<T> = Result<T, TransformError>;

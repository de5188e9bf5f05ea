use shapemap_store::StoreError;
use thiserror::Error;

/// Errors raised by validation, as opposed to nonconformance results.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// No explicit identifiers were given and no node has the shape's type.
    #[error("No shapes found of type {0}")]
    NoShapesFound(String),

    #[error("unknown shape: {0}")]
    UnknownShape(String),

    #[error("invalid node identifier {id}: {reason}")]
    InvalidNode { id: String, reason: String },

    /// A pluggable validator failed outright.
    #[error("validator failed: {0}")]
    Validator(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias for validation results.
pub type ValidateResult<T> = Result<T, ValidateError>;

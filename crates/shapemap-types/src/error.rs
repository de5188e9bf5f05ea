use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid document IRI: {0}")]
    InvalidDocument(String),

    #[error("invalid IRI {iri}: {reason}")]
    InvalidIri { iri: String, reason: String },

    #[error("expected a JSON object at the data root, got {0}")]
    NotAnObject(&'static str),
}

/// Convenience alias for type-level results.
pub type TypeResult<T> = Result<T, TypeError>;

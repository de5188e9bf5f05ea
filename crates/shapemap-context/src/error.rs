//! Error types for context resolution.

use thiserror::Error;

/// Errors that can occur while resolving field names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// No context defines the field. The message lists every context searched.
    #[error("Key: {field} could not be found in context: {contexts}")]
    UnresolvedField { field: String, contexts: String },

    /// The field's prefixed key uses a prefix missing from the prefix table.
    #[error("Key: {field} uses unknown prefix: {prefix}")]
    UnknownPrefix { field: String, prefix: String },

    /// The expanded predicate is not a valid IRI.
    #[error("Key: {field} expands to invalid predicate {iri}: {reason}")]
    InvalidPredicate {
        field: String,
        iri: String,
        reason: String,
    },
}

/// Convenience alias for context results.
pub type ContextResult<T> = Result<T, ContextError>;

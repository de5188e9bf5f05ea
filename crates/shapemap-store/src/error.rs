use shapemap_types::Statement;

/// Errors from triple store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A statement handed to a document replace belongs to another document.
    #[error("statement {statement} does not belong to document <{document}>")]
    ForeignStatement {
        statement: Box<Statement>,
        document: String,
    },

    /// An internal lock was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

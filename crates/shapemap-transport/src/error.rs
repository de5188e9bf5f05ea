use shapemap_types::Statement;

/// Errors from document transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The remote answered with a status the caller cannot recover from.
    #[error("request for <{uri}> failed with status {status}")]
    Status { uri: String, status: u16 },

    /// A write was refused by the remote.
    #[error("write rejected: {0}")]
    WriteRejected(String),

    /// A patch tried to delete a statement the remote does not hold.
    #[error("cannot delete missing statement {0}")]
    MissingStatement(Box<Statement>),

    /// A full-document replace carried a statement of another document.
    #[error("statement {statement} does not belong to document <{document}>")]
    ForeignStatement {
        statement: Box<Statement>,
        document: String,
    },

    #[error("transport state lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

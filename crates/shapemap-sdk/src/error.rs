use thiserror::Error;

/// Errors from shape operations.
///
/// The CRUD handlers never return these directly: every failure is folded
/// into the `errors` of a [`QueryResult`](crate::QueryResult) through its
/// `Display` text.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("Node with id: {id} already exists in doc:{doc}")]
    AlreadyExists { id: String, doc: String },

    #[error("Node with id: {id} does not exist in doc:{doc}")]
    DoesNotExist { id: String, doc: String },

    #[error("data for {0} must carry an id")]
    MissingId(String),

    #[error("shape {0} has no validator")]
    MissingValidator(String),

    #[error("invalid type IRI {iri}: {reason}")]
    InvalidType { iri: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Types(#[from] shapemap_types::TypeError),

    #[error(transparent)]
    Transform(#[from] shapemap_transform::TransformError),

    #[error(transparent)]
    Diff(#[from] shapemap_diff::DiffError),

    #[error(transparent)]
    Validate(#[from] shapemap_validate::ValidateError),

    #[error("store error: {0}")]
    Store(#[from] shapemap_store::StoreError),

    #[error("transport error: {0}")]
    Transport(#[from] shapemap_transport::TransportError),
}

pub type ShapeResult<T> = Result<T, ShapeError>;

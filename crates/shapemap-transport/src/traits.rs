use async_trait::async_trait;
use shapemap_types::{NamedNode, Statement};

use crate::error::TransportResult;

pub const STATUS_OK: u16 = 200;
pub const STATUS_NOT_FOUND: u16 = 404;

/// A fetched document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    /// Every statement of the document, tagged with the document.
    pub statements: Vec<Statement>,
}

impl FetchResponse {
    pub fn ok(statements: Vec<Statement>) -> Self {
        Self {
            status: STATUS_OK,
            statements,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: STATUS_NOT_FOUND,
            statements: Vec::new(),
        }
    }

    /// Returns `true` if the document does not exist yet.
    pub fn is_not_found(&self) -> bool {
        self.status == STATUS_NOT_FOUND
    }
}

/// Remote document access.
///
/// `fetch` resolves with a 404 response for a missing document; any other
/// failure status is a [`TransportError::Status`](crate::TransportError::Status).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, uri: &NamedNode) -> TransportResult<FetchResponse>;

    /// Apply a patch. Statements may span documents; each is applied to the
    /// document named by its graph.
    async fn update(&self, deletes: &[Statement], inserts: &[Statement]) -> TransportResult<()>;

    /// Replace the full contents of `uri`, creating it if needed.
    async fn put(&self, uri: &NamedNode, statements: &[Statement], content_type: &str) -> TransportResult<()>;
}

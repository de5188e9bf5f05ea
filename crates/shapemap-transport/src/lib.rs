//! Document transport for shapemap.
//!
//! A transport moves whole RDF documents between a remote pod and the local
//! triple store. It never parses wire formats for the mapping engine: it
//! hands back statements already tagged with the document they came from.
//!
//! # Operations
//!
//! - `fetch` -- load a document; status 404 means the document does not
//!   exist yet and is not an error
//! - `update` -- incremental patch (delete then insert)
//! - `put` -- full-document replace, used when creating a new document
//!
//! [`InMemoryTransport`] simulates a pod for tests and embedding.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{TransportError, TransportResult};
pub use memory::{InMemoryTransport, WriteRecord};
pub use traits::{FetchResponse, Transport, STATUS_NOT_FOUND, STATUS_OK};

//! Shape-driven CRUD over RDF documents.
//!
//! This is the main entry point of shapemap. A [`Shape`] couples a
//! [`ShapeDescriptor`] (shape id, field contexts, prefixes, types, and a
//! validator) with a local triple store and a document transport, and
//! exposes `find_one`, `find_all`, `create`, `update`, and `delete`.
//!
//! Every operation returns a [`QueryResult`] echoing the document argument:
//! failures of any kind are reported in `errors`, never raised.
//!
//! ```ignore
//! let shape = Shape::new(descriptor, store, transport);
//! let chat = shape.find_one(FindOne::new(doc).with_id(id)).await;
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod query;
pub mod shape;

pub use config::ShapeConfig;
pub use descriptor::{ShapeDescriptor, ShapeDescriptorBuilder};
pub use error::{ShapeError, ShapeResult};
pub use query::{Delete, DocRef, FindAll, FindOne, QueryResult, Write};
pub use shape::Shape;

// Re-export key types
pub use shapemap_diff::ChangeSet;
pub use shapemap_store::{InMemoryTripleStore, TripleStore};
pub use shapemap_transport::{InMemoryTransport, Transport};
pub use shapemap_types::{DataTree, FieldValue, NamedNode, Statement};
pub use shapemap_validate::{SchemaValidator, ShapeDecl, ShapeSchema, ShapeValidator, ShapedObject, TripleConstraint, ValueExpr};

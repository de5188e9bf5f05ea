//! Document-partitioned triple storage for shapemap.
//!
//! Every statement is tagged with the document (named graph) that owns it,
//! and a document is the unit of fetch and replace. The mapping engine only
//! talks to storage through the [`TripleStore`] trait.
//!
//! # Storage Backends
//!
//! - [`InMemoryTripleStore`] -- `RwLock`-guarded store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Statements are compared structurally (subject, predicate, object, graph).
//! 2. Inserting a statement that is already present is a no-op.
//! 3. Replacing a document never touches statements of other documents.
//! 4. All lock and consistency errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod traits;
pub mod walk;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryTripleStore;
pub use traits::TripleStore;
pub use walk::statements_of_node;

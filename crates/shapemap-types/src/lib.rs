//! Foundation types for shapemap.
//!
//! This crate provides the statement, identity, and value-tree types used
//! throughout the mapping engine. Every other shapemap crate depends on
//! `shapemap-types`.
//!
//! # Key Types
//!
//! - [`Statement`] -- a triple tagged with the document (graph) that owns it
//! - [`FieldValue`] / [`DataTree`] -- nested shaped data, keyed either by
//!   short field names (normalized) or by absolute predicate IRIs (absolute)
//! - [`NodeId`] -- the reserved `id` of a tree: caller-supplied text or an
//!   already allocated node
//! - [`NodeAllocator`] -- stable subject/object identity allocation scoped
//!   to a document
//!
//! RDF terms are re-exported from `oxrdf` so downstream crates share one
//! data model.

pub mod error;
pub mod identity;
pub mod statement;
pub mod value;

pub use error::{TypeError, TypeResult};
pub use identity::{NodeAllocator, DEFAULT_FRAGMENT_PREFIX};
pub use statement::{dedup_statements, node_to_term, term_to_node, Statement};
pub use value::{DataTree, FieldValue, NodeId, ID_KEY};

// Re-export the RDF data model.
pub use oxrdf::vocab;
pub use oxrdf::{BlankNode, Literal, NamedNode, NamedOrBlankNode, Term};

//! Context resolution for shapemap.
//!
//! A *context* maps the short field names developers write (`title`) to
//! prefixed predicate keys (`dc:title`); a prefix table expands those keys
//! into absolute predicate IRIs. This crate resolves in both directions and
//! builds the per-shape [`AliasTable`] used for alias-aware field access.
//!
//! The `id` field is never resolved through a context.

pub mod alias;
pub mod context;
pub mod error;
pub mod names;

pub use alias::AliasTable;
pub use context::{Context, ContextSet};
pub use error::{ContextError, ContextResult};
pub use names::{camel_case, local_name};

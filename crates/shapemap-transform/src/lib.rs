//! Mapping between shaped data and statements.
//!
//! Two stages turn developer-facing data into statements:
//!
//! 1. [`normalized_to_absolute`] replaces every short field name with its
//!    absolute predicate IRI (all-or-nothing: one unresolvable field fails
//!    the whole call). [`absolute_to_normalized`] is the inverse.
//! 2. [`StatementSynthesizer`] walks an absolute tree and emits the typed
//!    statements that describe it, allocating node identities for nested
//!    entities.

pub mod error;
pub mod normalize;
pub mod synthesize;

pub use error::{TransformError, TransformResult};
pub use normalize::{absolute_to_normalized, normalized_to_absolute};
pub use synthesize::{literal_for, StatementSynthesizer};

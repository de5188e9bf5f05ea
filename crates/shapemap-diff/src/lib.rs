//! Diff engine for shapemap.
//!
//! Given statements proposed for an entity and the current store contents,
//! computes the minimal [`ChangeSet`] that moves the store to the proposed
//! state:
//!
//! - [`deletes_for_insert`] retracts old values of every predicate being
//!   written, so a single-valued field never holds two values at once
//! - [`deletes_for_orphans`] retracts owned sub-trees that those deletes
//!   leave unreachable
//! - [`deletes_for_empty_values`] retracts whole sub-trees of fields being
//!   cleared

pub mod changes;
pub mod error;

pub use changes::{deletes_for_empty_values, deletes_for_insert, deletes_for_orphans, ChangeSet};
pub use error::{DiffError, DiffResult};

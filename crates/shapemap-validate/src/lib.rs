//! Shape validation for shapemap.
//!
//! Validation runs in four steps: scope the statements to the requested
//! documents, pick candidate nodes (explicit identifiers, or every node
//! typed with one of the shape's classes), hand each candidate to a
//! [`ShapeValidator`], and classify the results. Conformant nodes are
//! projected into [`ShapedObject`]s; nonconformant ones are rendered into
//! human-readable failure lines.
//!
//! [`SchemaValidator`] is a reference validator over a programmatic
//! [`ShapeSchema`]. Any other engine can be plugged in through the
//! [`ShapeValidator`] trait.

pub mod db;
pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod project;
pub mod render;
pub mod schema;
pub mod shaped;
pub mod validator;

pub use db::ValidationDb;
pub use error::{ValidateError, ValidateResult};
pub use orchestrator::{NodeFailures, ValidationOrchestrator, ValidationReport};
pub use outcome::{
    node_label, Failure, MatchTree, MatchValue, ShapeTarget, ShapeValidator, ValidationResult, ValidationStatus,
};
pub use project::{match_tree_to_absolute, project, term_to_field};
pub use render::render_failures;
pub use schema::{ShapeDecl, ShapeSchema, TripleConstraint, TripleExpr, ValueExpr};
pub use shaped::ShapedObject;
pub use validator::SchemaValidator;

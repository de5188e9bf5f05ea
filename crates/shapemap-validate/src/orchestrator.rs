use std::sync::Arc;

use shapemap_context::{AliasTable, ContextSet};
use shapemap_store::TripleStore;
use shapemap_types::{NamedNode, NamedOrBlankNode, Statement};
use tracing::{debug, info};

use crate::db::ValidationDb;
use crate::error::{ValidateError, ValidateResult};
use crate::outcome::{node_label, ShapeTarget, ShapeValidator, ValidationStatus};
use crate::project::project;
use crate::render::render_failures;
use crate::shaped::ShapedObject;

/// Rendered failures of one nonconformant node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeFailures {
    pub node: String,
    pub messages: Vec<String>,
}

/// Outcome of validating a batch of nodes.
///
/// Every validated node lands in exactly one of `shapes` or `failures`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    pub shapes: Vec<ShapedObject>,
    pub failures: Vec<NodeFailures>,
}

impl ValidationReport {
    /// Returns `true` if no node failed.
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of nodes validated.
    pub fn len(&self) -> usize {
        self.shapes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split into projected shapes and flattened failure lines, each `None`
    /// when empty.
    pub fn into_parts(self) -> (Option<Vec<ShapedObject>>, Option<Vec<String>>) {
        let shapes = (!self.shapes.is_empty()).then_some(self.shapes);
        let errors = (!self.failures.is_empty()).then(|| {
            self.failures
                .into_iter()
                .flat_map(|failures| failures.messages)
                .collect()
        });
        (shapes, errors)
    }
}

/// Scopes statements, picks candidates, validates, and projects.
pub struct ValidationOrchestrator<'a> {
    validator: &'a dyn ShapeValidator,
    shape_id: &'a str,
    types: &'a [NamedNode],
    contexts: &'a ContextSet,
    aliases: Arc<AliasTable>,
}

impl<'a> ValidationOrchestrator<'a> {
    pub fn new(
        validator: &'a dyn ShapeValidator,
        shape_id: &'a str,
        types: &'a [NamedNode],
        contexts: &'a ContextSet,
        aliases: Arc<AliasTable>,
    ) -> Self {
        Self {
            validator,
            shape_id,
            types,
            contexts,
            aliases,
        }
    }

    /// Validate nodes of `store` restricted to `scope` (every document when
    /// empty).
    ///
    /// With `ids`, exactly those nodes are validated. Without, every node
    /// typed with one of the shape's classes is; finding none is the
    /// [`ValidateError::NoShapesFound`] error rather than an empty report.
    pub fn validate(
        &self,
        store: &dyn TripleStore,
        scope: &[NamedNode],
        ids: Option<&[String]>,
    ) -> ValidateResult<ValidationReport> {
        let statements = scoped_statements(store, scope)?;
        self.validate_statements(statements, ids)
    }

    /// Validate against an explicit set of statements.
    pub fn validate_statements(
        &self,
        statements: Vec<Statement>,
        ids: Option<&[String]>,
    ) -> ValidateResult<ValidationReport> {
        let db = ValidationDb::from_statements(statements);
        let candidates = match ids {
            Some(ids) => ids.iter().map(|id| parse_node(id)).collect::<ValidateResult<Vec<_>>>()?,
            None => {
                let found = db.nodes_of_types(self.types);
                if found.is_empty() {
                    return Err(ValidateError::NoShapesFound(self.shape_id.to_string()));
                }
                found
            }
        };
        debug!(shape = self.shape_id, candidates = candidates.len(), statements = db.len(), "validating");

        let targets: Vec<ShapeTarget> = candidates
            .into_iter()
            .map(|node| ShapeTarget::new(node, self.shape_id))
            .collect();
        let results = self.validator.validate(&db, &targets)?;
        if results.len() != targets.len() {
            return Err(ValidateError::Validator(format!(
                "expected {} results, got {}",
                targets.len(),
                results.len()
            )));
        }

        let mut report = ValidationReport::default();
        for result in results {
            match result.status {
                ValidationStatus::Conformant(tree) => report.shapes.push(project(
                    &tree,
                    &result.node,
                    &result.shape,
                    self.contexts,
                    Arc::clone(&self.aliases),
                )),
                ValidationStatus::Nonconformant(failures) => {
                    let node = node_label(&result.node);
                    let messages = render_failures(&node, &result.shape, &failures);
                    report.failures.push(NodeFailures { node, messages });
                }
            }
        }
        info!(
            shape = self.shape_id,
            conformant = report.shapes.len(),
            nonconformant = report.failures.len(),
            "validation finished"
        );
        Ok(report)
    }
}

fn scoped_statements(store: &dyn TripleStore, scope: &[NamedNode]) -> ValidateResult<Vec<Statement>> {
    if scope.is_empty() {
        return Ok(store.match_pattern(None, None, None, None)?);
    }
    let mut statements = Vec::new();
    for document in scope {
        statements.extend(store.document_statements(document)?);
    }
    Ok(statements)
}

fn parse_node(id: &str) -> ValidateResult<NamedOrBlankNode> {
    NamedNode::new(id)
        .map(Into::into)
        .map_err(|e| ValidateError::InvalidNode {
            id: id.to_string(),
            reason: e.to_string(),
        })
}

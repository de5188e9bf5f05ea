//! Statement synthesis from absolute trees.

use chrono::SecondsFormat;
use shapemap_store::TripleStore;
use shapemap_types::vocab::xsd;
use shapemap_types::{
    dedup_statements, node_to_term, DataTree, FieldValue, Literal, NamedNode, NamedOrBlankNode,
    NodeAllocator, Statement, Term,
};
use tracing::debug;

use crate::error::{TransformError, TransformResult};

/// Builds the statements that describe an absolute tree.
#[derive(Clone, Debug, Default)]
pub struct StatementSynthesizer {
    allocator: NodeAllocator,
}

impl StatementSynthesizer {
    pub fn new(allocator: NodeAllocator) -> Self {
        Self { allocator }
    }

    pub fn allocator(&self) -> &NodeAllocator {
        &self.allocator
    }

    /// The subject identity of the tree's root entity in `document`.
    ///
    /// A tree without a usable `id` gets a freshly minted identity on every
    /// call, so callers that need the subject afterwards should allocate it
    /// once and pass it to [`synthesize_for`](Self::synthesize_for).
    pub fn subject_of(&self, absolute: &DataTree, document: &NamedNode) -> NamedOrBlankNode {
        self.allocator.allocate(document, absolute.id.as_ref())
    }

    /// Synthesize the statements describing `absolute` inside `document`.
    pub fn synthesize(
        &self,
        store: &dyn TripleStore,
        absolute: &DataTree,
        document: &NamedNode,
    ) -> TransformResult<Vec<Statement>> {
        let subject = self.subject_of(absolute, document);
        self.synthesize_for(store, absolute, &subject, document)
    }

    /// Synthesize with an already allocated root subject.
    ///
    /// Empty values emit nothing. The store is consulted so a nested object
    /// reuses the node already linked from its parent. The result holds no
    /// two structurally equal statements.
    pub fn synthesize_for(
        &self,
        store: &dyn TripleStore,
        absolute: &DataTree,
        subject: &NamedOrBlankNode,
        document: &NamedNode,
    ) -> TransformResult<Vec<Statement>> {
        let mut out = Vec::new();
        self.emit_tree(store, absolute, subject, document, &mut out)?;
        let out = dedup_statements(out);
        debug!(subject = %subject, document = %document, statements = out.len(), "synthesized statements");
        Ok(out)
    }

    fn emit_tree(
        &self,
        store: &dyn TripleStore,
        tree: &DataTree,
        subject: &NamedOrBlankNode,
        document: &NamedNode,
        out: &mut Vec<Statement>,
    ) -> TransformResult<()> {
        for (key, value) in &tree.fields {
            if value.is_empty() {
                continue;
            }
            let predicate = NamedNode::new(key.as_str()).map_err(|e| TransformError::InvalidPredicate {
                predicate: key.clone(),
                reason: e.to_string(),
            })?;
            self.emit_value(store, subject, &predicate, value, document, out)?;
        }
        Ok(())
    }

    fn emit_value(
        &self,
        store: &dyn TripleStore,
        subject: &NamedOrBlankNode,
        predicate: &NamedNode,
        value: &FieldValue,
        document: &NamedNode,
        out: &mut Vec<Statement>,
    ) -> TransformResult<()> {
        match value {
            FieldValue::List(items) => {
                for item in items.iter().filter(|item| !item.is_empty()) {
                    match item {
                        // Each element is its own entity, never the parent.
                        // Id-less elements are minted afresh; the diff
                        // retracts the ones they replace.
                        FieldValue::Object(tree) => {
                            let node = self.allocator.allocate(document, tree.id.as_ref());
                            out.push(link(subject, predicate, &node, document));
                            self.emit_tree(store, tree, &node, document, out)?;
                        }
                        other => self.emit_value(store, subject, predicate, other, document, out)?,
                    }
                }
            }
            FieldValue::Object(tree) => {
                let node = self.nested_node(store, subject, predicate, tree, document)?;
                out.push(link(subject, predicate, &node, document));
                self.emit_tree(store, tree, &node, document, out)?;
            }
            scalar => {
                if let Some(object) = literal_for(scalar) {
                    out.push(Statement::new(subject.clone(), predicate.clone(), object, document.clone()));
                }
            }
        }
        Ok(())
    }

    /// The identity of a single nested object: the node already linked
    /// from `(subject, predicate)` in this document, unless that node is
    /// a blank node, else one allocated from the object's own `id`.
    fn nested_node(
        &self,
        store: &dyn TripleStore,
        subject: &NamedOrBlankNode,
        predicate: &NamedNode,
        tree: &DataTree,
        document: &NamedNode,
    ) -> TransformResult<NamedOrBlankNode> {
        let existing = store.any_object(subject, predicate, Some(document))?;
        Ok(match existing {
            Some(Term::NamedNode(node)) => node.into(),
            _ => self.allocator.allocate(document, tree.id.as_ref()),
        })
    }
}

fn link(subject: &NamedOrBlankNode, predicate: &NamedNode, node: &NamedOrBlankNode, document: &NamedNode) -> Statement {
    Statement::new(subject.clone(), predicate.clone(), node_to_term(node), document.clone())
}

/// The object term for a scalar value, or `None` for non-scalars.
///
/// - integers become `xsd:integer`, other numbers `xsd:decimal`
/// - booleans become `xsd:boolean`, dates `xsd:dateTime`
/// - text that parses as an absolute IRI becomes a named node, other text
///   a plain literal
pub fn literal_for(value: &FieldValue) -> Option<Term> {
    let term = match value {
        FieldValue::Text(text) => match NamedNode::new(text.as_str()) {
            Ok(node) => node.into(),
            Err(_) => Literal::new_simple_literal(text.as_str()).into(),
        },
        FieldValue::Number(n) if n.is_i64() || n.is_u64() => {
            Literal::new_typed_literal(n.to_string(), xsd::INTEGER).into()
        }
        FieldValue::Number(n) => Literal::new_typed_literal(n.to_string(), xsd::DECIMAL).into(),
        FieldValue::Boolean(b) => Literal::new_typed_literal(b.to_string(), xsd::BOOLEAN).into(),
        FieldValue::DateTime(dt) => {
            Literal::new_typed_literal(dt.to_rfc3339_opts(SecondsFormat::Millis, true), xsd::DATE_TIME).into()
        }
        FieldValue::Url(node) => node.clone().into(),
        FieldValue::Term(term) => term.clone(),
        FieldValue::Null | FieldValue::List(_) | FieldValue::Object(_) => return None,
    };
    Some(term)
}

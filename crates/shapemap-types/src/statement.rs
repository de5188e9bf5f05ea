use std::collections::HashSet;
use std::fmt;

use oxrdf::{NamedNode, NamedOrBlankNode, Term};

use crate::error::{TypeError, TypeResult};

/// A single RDF triple tagged with the document (named graph) that owns it.
///
/// Statements are the atomic unit of storage and diffing. Equality and
/// hashing are structural over `(subject, predicate, object, graph)`, so two
/// statements built independently from the same terms compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: NamedOrBlankNode,
    pub predicate: NamedNode,
    pub object: Term,
    pub graph: NamedNode,
}

impl Statement {
    /// Create a new statement.
    pub fn new(
        subject: impl Into<NamedOrBlankNode>,
        predicate: impl Into<NamedNode>,
        object: impl Into<Term>,
        graph: impl Into<NamedNode>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph: graph.into(),
        }
    }

    /// Parse a document IRI into the graph node that tags its statements.
    ///
    /// Any fragment is stripped: `https://pod/doc#me` and `https://pod/doc`
    /// name the same document.
    pub fn document(doc: &str) -> TypeResult<NamedNode> {
        let base = doc.split('#').next().unwrap_or(doc);
        NamedNode::new(base).map_err(|e| TypeError::InvalidDocument(format!("{doc}: {e}")))
    }

    /// The object as a node, if it is an IRI or blank node.
    pub fn object_node(&self) -> Option<NamedOrBlankNode> {
        term_to_node(&self.object)
    }

    /// Returns `true` if `node` is the subject of this statement.
    pub fn has_subject(&self, node: &NamedOrBlankNode) -> bool {
        &self.subject == node
    }

    /// Returns `true` if `node` is the object of this statement.
    pub fn has_object_node(&self, node: &NamedOrBlankNode) -> bool {
        self.object_node().as_ref() == Some(node)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} .",
            self.subject, self.predicate, self.object, self.graph
        )
    }
}

/// Convert a subject-position node into an object-position term.
pub fn node_to_term(node: &NamedOrBlankNode) -> Term {
    match node {
        NamedOrBlankNode::NamedNode(n) => Term::NamedNode(n.clone()),
        NamedOrBlankNode::BlankNode(b) => Term::BlankNode(b.clone()),
    }
}

/// Convert a term into a node, if it can appear in subject position.
pub fn term_to_node(term: &Term) -> Option<NamedOrBlankNode> {
    match term {
        Term::NamedNode(n) => Some(NamedOrBlankNode::NamedNode(n.clone())),
        Term::BlankNode(b) => Some(NamedOrBlankNode::BlankNode(b.clone())),
        _ => None,
    }
}

/// Structurally deduplicate statements, keeping the first occurrence of each.
pub fn dedup_statements(statements: impl IntoIterator<Item = Statement>) -> Vec<Statement> {
    let mut seen = HashSet::new();
    statements
        .into_iter()
        .filter(|st| seen.insert(st.clone()))
        .collect()
}

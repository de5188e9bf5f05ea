//! Validator interface and result types.

use std::collections::BTreeMap;
use std::fmt;

use shapemap_types::{NamedOrBlankNode, Term};

use crate::db::ValidationDb;
use crate::error::ValidateResult;

/// A node to validate against a shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeTarget {
    pub node: NamedOrBlankNode,
    pub shape: String,
}

impl ShapeTarget {
    pub fn new(node: impl Into<NamedOrBlankNode>, shape: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            shape: shape.into(),
        }
    }
}

/// The plain text of a node: the IRI of a named node, `_:label` for a
/// blank node.
pub fn node_label(node: &NamedOrBlankNode) -> String {
    match node {
        NamedOrBlankNode::NamedNode(n) => n.as_str().to_string(),
        other => other.to_string(),
    }
}

/// A shape-constraint engine.
///
/// Implementations must return exactly one result per target, in target
/// order. Nonconformance is a result, not an error; errors are reserved for
/// failures of the engine itself (such as an unknown shape).
pub trait ShapeValidator: Send + Sync {
    fn validate(&self, db: &ValidationDb, targets: &[ShapeTarget]) -> ValidateResult<Vec<ValidationResult>>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidationResult {
    pub node: NamedOrBlankNode,
    pub shape: String,
    pub status: ValidationStatus,
}

impl ValidationResult {
    pub fn is_conformant(&self) -> bool {
        matches!(self.status, ValidationStatus::Conformant(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValidationStatus {
    /// The node conforms; the tree holds the values each constraint matched.
    Conformant(MatchTree),
    Nonconformant(Vec<Failure>),
}

/// The values matched for each predicate of a conformant node, keyed by
/// predicate IRI.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchTree {
    entries: BTreeMap<String, Vec<MatchValue>>,
}

impl MatchTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: impl Into<String>, value: MatchValue) {
        self.entries.entry(predicate.into()).or_default().push(value);
    }

    /// Move every entry of `other` into this tree.
    pub fn merge(&mut self, other: MatchTree) {
        for (predicate, values) in other.entries {
            self.entries.entry(predicate).or_default().extend(values);
        }
    }

    pub fn get(&self, predicate: &str) -> Option<&[MatchValue]> {
        self.entries.get(predicate).map(Vec::as_slice)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &[MatchValue])> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A matched value; `nested` is set when the value was validated against a
/// referenced shape.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchValue {
    pub term: Term,
    pub nested: Option<MatchTree>,
}

impl MatchValue {
    pub fn leaf(term: impl Into<Term>) -> Self {
        Self {
            term: term.into(),
            nested: None,
        }
    }
}

/// Why a node does not conform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    MissingProperty {
        predicate: String,
    },
    ExceedsCardinality {
        predicate: String,
        found: usize,
        min: u32,
        max: Option<u32>,
    },
    BelowCardinality {
        predicate: String,
        found: usize,
        min: u32,
        max: Option<u32>,
    },
    MismatchedDatatype {
        predicate: String,
        value: String,
        expected: String,
    },
    NodeKindMismatch {
        predicate: String,
        value: String,
        expected: String,
    },
    NotInValueSet {
        predicate: String,
        value: String,
    },
    UnexpectedProperty {
        predicate: String,
    },
    /// A value failed the shape it references.
    ShapeReference {
        node: String,
        shape: String,
        failures: Vec<Failure>,
    },
    /// Every branch of a disjunction failed.
    Alternatives(Vec<Vec<Failure>>),
}

fn cardinality(min: u32, max: Option<u32>) -> String {
    match max {
        Some(max) => format!("{{{min},{max}}}"),
        None => format!("{{{min},*}}"),
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProperty { predicate } => write!(f, "Missing property: {predicate}"),
            Self::ExceedsCardinality {
                predicate,
                found,
                min,
                max,
            } => write!(
                f,
                "{found} values of {predicate} exceeds cardinality {}",
                cardinality(*min, *max)
            ),
            Self::BelowCardinality {
                predicate,
                found,
                min,
                max,
            } => write!(
                f,
                "{found} values of {predicate} is below cardinality {}",
                cardinality(*min, *max)
            ),
            Self::MismatchedDatatype {
                predicate,
                value,
                expected,
            } => write!(f, "{predicate}: mismatched datatype: {value} is not a {expected}"),
            Self::NodeKindMismatch {
                predicate,
                value,
                expected,
            } => write!(f, "{predicate}: {value} is not {expected}"),
            Self::NotInValueSet { predicate, value } => {
                write!(f, "{predicate}: {value} is not in the value set")
            }
            Self::UnexpectedProperty { predicate } => write!(f, "Unexpected property: {predicate}"),
            Self::ShapeReference { node, shape, .. } => write!(f, "validating {node} as {shape}"),
            Self::Alternatives(branches) => write!(f, "{} alternatives failed", branches.len()),
        }
    }
}

//! Programmatic shape schemas.
//!
//! A schema is a set of named shape declarations. Each declaration holds a
//! triple expression: triple constraints combined with `EachOf` (all must
//! hold) and `OneOf` (exactly the first satisfiable branch is used). Parsing
//! schemas from source text is left to callers.

use std::collections::{BTreeMap, HashMap, HashSet};

use shapemap_types::{NamedNode, Term};

/// A set of shape declarations plus the prefixes they were written with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeSchema {
    prefixes: BTreeMap<String, String>,
    shapes: HashMap<String, ShapeDecl>,
}

impl ShapeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style prefix binding.
    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), namespace.into());
        self
    }

    /// Builder-style shape declaration.
    pub fn with_shape(mut self, id: impl Into<String>, decl: ShapeDecl) -> Self {
        self.shapes.insert(id.into(), decl);
        self
    }

    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }

    pub fn shape(&self, id: &str) -> Option<&ShapeDecl> {
        self.shapes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.shapes.contains_key(id)
    }
}

/// One shape: a triple expression plus openness settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeDecl {
    /// Predicates whose non-matching values are tolerated.
    pub extra: Vec<NamedNode>,
    /// Reject predicates the expression does not mention.
    pub closed: bool,
    pub expression: Option<TripleExpr>,
}

impl ShapeDecl {
    pub fn new(expression: TripleExpr) -> Self {
        Self {
            extra: Vec::new(),
            closed: false,
            expression: Some(expression),
        }
    }

    /// A shape requiring every constraint to hold.
    pub fn each_of(constraints: impl IntoIterator<Item = TripleConstraint>) -> Self {
        Self::new(TripleExpr::EachOf(
            constraints.into_iter().map(TripleExpr::Constraint).collect(),
        ))
    }

    pub fn with_extra(mut self, predicate: NamedNode) -> Self {
        self.extra.push(predicate);
        self
    }

    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    /// Every predicate mentioned by the expression.
    pub fn predicates(&self) -> HashSet<NamedNode> {
        let mut out = HashSet::new();
        if let Some(expression) = &self.expression {
            expression.collect_predicates(&mut out);
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TripleExpr {
    Constraint(TripleConstraint),
    EachOf(Vec<TripleExpr>),
    OneOf(Vec<TripleExpr>),
}

impl TripleExpr {
    fn collect_predicates(&self, out: &mut HashSet<NamedNode>) {
        match self {
            Self::Constraint(c) => {
                out.insert(c.predicate.clone());
            }
            Self::EachOf(items) | Self::OneOf(items) => {
                for item in items {
                    item.collect_predicates(out);
                }
            }
        }
    }
}

impl From<TripleConstraint> for TripleExpr {
    fn from(value: TripleConstraint) -> Self {
        Self::Constraint(value)
    }
}

/// A constraint on the values of one predicate.
///
/// Cardinality defaults to exactly one; `max = None` is unbounded.
#[derive(Clone, Debug, PartialEq)]
pub struct TripleConstraint {
    pub predicate: NamedNode,
    pub value: ValueExpr,
    pub min: u32,
    pub max: Option<u32>,
}

impl TripleConstraint {
    pub fn new(predicate: NamedNode, value: ValueExpr) -> Self {
        Self {
            predicate,
            value,
            min: 1,
            max: Some(1),
        }
    }

    /// `?`
    pub fn optional(self) -> Self {
        self.cardinality(0, Some(1))
    }

    /// `*`
    pub fn zero_or_more(self) -> Self {
        self.cardinality(0, None)
    }

    /// `+`
    pub fn one_or_more(self) -> Self {
        self.cardinality(1, None)
    }

    pub fn cardinality(mut self, min: u32, max: Option<u32>) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

/// What a single value must look like.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueExpr {
    Any,
    Iri,
    Literal,
    Datatype(NamedNode),
    ValueSet(Vec<Term>),
    /// The value must be a node conforming to the referenced shape.
    ShapeRef(String),
}

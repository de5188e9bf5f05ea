use std::collections::HashSet;
use std::sync::Arc;

use chrono::DateTime;
use shapemap_types::vocab::xsd;
use shapemap_types::{term_to_node, NamedNode, NamedOrBlankNode, Statement, Term};
use tracing::debug;

use crate::db::ValidationDb;
use crate::error::{ValidateError, ValidateResult};
use crate::outcome::{
    node_label, Failure, MatchTree, MatchValue, ShapeTarget, ShapeValidator, ValidationResult, ValidationStatus,
};
use crate::schema::{ShapeDecl, ShapeSchema, TripleConstraint, TripleExpr, ValueExpr};

type Outcome<T> = Result<T, Vec<Failure>>;

/// Shapes currently being checked, to cut reference cycles.
type InProgress = HashSet<(NamedOrBlankNode, String)>;

/// Reference validator over a [`ShapeSchema`].
///
/// Each value of a constrained predicate is tested against the constraint's
/// value expression; matching values count toward the cardinality.
/// Values rejected by every constraint on their predicate are failures
/// unless the predicate is declared `extra`.
#[derive(Clone, Debug)]
pub struct SchemaValidator {
    schema: Arc<ShapeSchema>,
}

impl SchemaValidator {
    pub fn new(schema: impl Into<Arc<ShapeSchema>>) -> Self {
        Self {
            schema: schema.into(),
        }
    }

    pub fn schema(&self) -> &ShapeSchema {
        &self.schema
    }

    fn check_node(
        &self,
        db: &ValidationDb,
        node: &NamedOrBlankNode,
        shape: &str,
        in_progress: &mut InProgress,
    ) -> ValidateResult<Outcome<MatchTree>> {
        let decl = self
            .schema
            .shape(shape)
            .ok_or_else(|| ValidateError::UnknownShape(shape.to_string()))?;
        let triples: Vec<&Statement> = db.outgoing(node).collect();

        let evaluated = match &decl.expression {
            Some(expression) => match self.eval(db, expression, &triples, in_progress)? {
                Ok(evaluated) => evaluated,
                Err(failures) => return Ok(Err(failures)),
            },
            None => Evaluated::default(),
        };

        let failures = leftover_failures(decl, &triples, &evaluated);
        if failures.is_empty() {
            Ok(Ok(evaluated.tree))
        } else {
            Ok(Err(failures))
        }
    }

    fn eval(
        &self,
        db: &ValidationDb,
        expression: &TripleExpr,
        triples: &[&Statement],
        in_progress: &mut InProgress,
    ) -> ValidateResult<Outcome<Evaluated>> {
        match expression {
            TripleExpr::Constraint(constraint) => self.eval_constraint(db, constraint, triples, in_progress),
            TripleExpr::EachOf(items) => {
                let mut all = Evaluated::default();
                let mut failures = Vec::new();
                for item in items {
                    match self.eval(db, item, triples, in_progress)? {
                        Ok(evaluated) => all.absorb(evaluated),
                        Err(found) => failures.extend(found),
                    }
                }
                Ok(if failures.is_empty() { Ok(all) } else { Err(failures) })
            }
            TripleExpr::OneOf(branches) => {
                let mut failed = Vec::new();
                for branch in branches {
                    match self.eval(db, branch, triples, in_progress)? {
                        Ok(evaluated) => return Ok(Ok(evaluated)),
                        Err(found) => failed.push(found),
                    }
                }
                Ok(Err(match failed.len() {
                    1 => failed.into_iter().flatten().collect(),
                    _ => vec![Failure::Alternatives(failed)],
                }))
            }
        }
    }

    fn eval_constraint(
        &self,
        db: &ValidationDb,
        constraint: &TripleConstraint,
        triples: &[&Statement],
        in_progress: &mut InProgress,
    ) -> ValidateResult<Outcome<Evaluated>> {
        let mut evaluated = Evaluated::default();
        let mut matched = Vec::new();
        for (index, st) in triples
            .iter()
            .enumerate()
            .filter(|(_, st)| st.predicate == constraint.predicate)
        {
            match self.check_value(db, &constraint.predicate, &constraint.value, &st.object, in_progress)? {
                Ok(value) => {
                    matched.push(value);
                    evaluated.consumed.insert(index);
                }
                Err(failure) => evaluated.rejected.push((index, failure)),
            }
        }

        let predicate = constraint.predicate.as_str().to_string();
        let found = matched.len();
        if (found as u64) < u64::from(constraint.min) {
            let failures = if !evaluated.rejected.is_empty() {
                evaluated.rejected.into_iter().map(|(_, failure)| failure).collect()
            } else if found == 0 {
                vec![Failure::MissingProperty { predicate }]
            } else {
                vec![Failure::BelowCardinality {
                    predicate,
                    found,
                    min: constraint.min,
                    max: constraint.max,
                }]
            };
            return Ok(Err(failures));
        }
        if let Some(max) = constraint.max {
            if found as u64 > u64::from(max) {
                return Ok(Err(vec![Failure::ExceedsCardinality {
                    predicate,
                    found,
                    min: constraint.min,
                    max: constraint.max,
                }]));
            }
        }
        for value in matched {
            evaluated.tree.push(predicate.clone(), value);
        }
        Ok(Ok(evaluated))
    }

    fn check_value(
        &self,
        db: &ValidationDb,
        predicate: &NamedNode,
        expected: &ValueExpr,
        term: &Term,
        in_progress: &mut InProgress,
    ) -> ValidateResult<Result<MatchValue, Failure>> {
        let predicate_str = || predicate.as_str().to_string();
        let kind_mismatch = |kind: &str| Failure::NodeKindMismatch {
            predicate: predicate_str(),
            value: term.to_string(),
            expected: kind.to_string(),
        };
        let outcome = match expected {
            ValueExpr::Any => Ok(MatchValue::leaf(term.clone())),
            ValueExpr::Iri => match term {
                Term::NamedNode(_) => Ok(MatchValue::leaf(term.clone())),
                _ => Err(kind_mismatch("an IRI")),
            },
            ValueExpr::Literal => match term {
                Term::Literal(_) => Ok(MatchValue::leaf(term.clone())),
                _ => Err(kind_mismatch("a literal")),
            },
            ValueExpr::Datatype(datatype) => match term {
                Term::Literal(literal)
                    if literal.datatype().as_str() == datatype.as_str()
                        && lexical_form_valid(literal.value(), datatype.as_str()) =>
                {
                    Ok(MatchValue::leaf(term.clone()))
                }
                _ => Err(Failure::MismatchedDatatype {
                    predicate: predicate_str(),
                    value: term.to_string(),
                    expected: datatype.as_str().to_string(),
                }),
            },
            ValueExpr::ValueSet(allowed) => {
                if allowed.contains(term) {
                    Ok(MatchValue::leaf(term.clone()))
                } else {
                    Err(Failure::NotInValueSet {
                        predicate: predicate_str(),
                        value: term.to_string(),
                    })
                }
            }
            ValueExpr::ShapeRef(shape) => match term_to_node(term) {
                None => Err(kind_mismatch("a node")),
                Some(node) => {
                    let key = (node.clone(), shape.clone());
                    if !in_progress.insert(key.clone()) {
                        // Already being checked further up: assume it holds.
                        Ok(MatchValue::leaf(term.clone()))
                    } else {
                        let nested = self.check_node(db, &node, shape, in_progress)?;
                        in_progress.remove(&key);
                        match nested {
                            Ok(tree) => Ok(MatchValue {
                                term: term.clone(),
                                nested: Some(tree),
                            }),
                            Err(failures) => Err(Failure::ShapeReference {
                                node: node_label(&node),
                                shape: shape.clone(),
                                failures,
                            }),
                        }
                    }
                }
            },
        };
        Ok(outcome)
    }
}

impl ShapeValidator for SchemaValidator {
    fn validate(&self, db: &ValidationDb, targets: &[ShapeTarget]) -> ValidateResult<Vec<ValidationResult>> {
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let mut in_progress = InProgress::new();
            in_progress.insert((target.node.clone(), target.shape.clone()));
            let status = match self.check_node(db, &target.node, &target.shape, &mut in_progress)? {
                Ok(tree) => ValidationStatus::Conformant(tree),
                Err(failures) => ValidationStatus::Nonconformant(failures),
            };
            debug!(
                node = %target.node,
                shape = %target.shape,
                conformant = matches!(status, ValidationStatus::Conformant(_)),
                "validated node"
            );
            results.push(ValidationResult {
                node: target.node.clone(),
                shape: target.shape.clone(),
                status,
            });
        }
        Ok(results)
    }
}

#[derive(Default)]
struct Evaluated {
    tree: MatchTree,
    consumed: HashSet<usize>,
    rejected: Vec<(usize, Failure)>,
}

impl Evaluated {
    fn absorb(&mut self, other: Evaluated) {
        self.tree.merge(other.tree);
        self.consumed.extend(other.consumed);
        self.rejected.extend(other.rejected);
    }
}

/// Failures for values no constraint accepted, plus unexpected predicates
/// on closed shapes.
fn leftover_failures(decl: &ShapeDecl, triples: &[&Statement], evaluated: &Evaluated) -> Vec<Failure> {
    let mut failures = Vec::new();
    let mut reported = HashSet::new();
    for (index, failure) in &evaluated.rejected {
        let predicate = &triples[*index].predicate;
        if evaluated.consumed.contains(index) || decl.extra.contains(predicate) {
            continue;
        }
        if reported.insert(*index) {
            failures.push(failure.clone());
        }
    }
    if decl.closed {
        let mentioned = decl.predicates();
        for st in triples {
            if !mentioned.contains(&st.predicate) && !decl.extra.contains(&st.predicate) {
                failures.push(Failure::UnexpectedProperty {
                    predicate: st.predicate.as_str().to_string(),
                });
            }
        }
    }
    failures
}

/// Lexical check for the XSD datatypes data is written with.
fn lexical_form_valid(value: &str, datatype: &str) -> bool {
    if datatype == xsd::INTEGER.as_str() {
        value.parse::<i64>().is_ok()
    } else if datatype == xsd::DECIMAL.as_str() {
        !value.contains(['e', 'E']) && value.parse::<f64>().is_ok()
    } else if datatype == xsd::BOOLEAN.as_str() {
        matches!(value, "true" | "false" | "1" | "0")
    } else if datatype == xsd::DATE_TIME.as_str() {
        DateTime::parse_from_rfc3339(value).is_ok()
    } else {
        true
    }
}

use std::collections::{HashMap, HashSet};

use shapemap_types::vocab::rdf;
use shapemap_types::{NamedNode, NamedOrBlankNode, Statement, Term};

/// The triples a validator sees.
///
/// Built from the statements in scope; graph tags are dropped, so a triple
/// asserted in two scoped documents counts once.
#[derive(Clone, Debug, Default)]
pub struct ValidationDb {
    statements: Vec<Statement>,
    by_subject: HashMap<NamedOrBlankNode, Vec<usize>>,
}

impl ValidationDb {
    pub fn from_statements(statements: impl IntoIterator<Item = Statement>) -> Self {
        let mut db = Self::default();
        let mut seen: HashSet<(NamedOrBlankNode, NamedNode, Term)> = HashSet::new();
        for st in statements {
            if !seen.insert((st.subject.clone(), st.predicate.clone(), st.object.clone())) {
                continue;
            }
            db.by_subject
                .entry(st.subject.clone())
                .or_default()
                .push(db.statements.len());
            db.statements.push(st);
        }
        db
    }

    /// Statements with `node` as subject, in insertion order.
    pub fn outgoing<'a>(&'a self, node: &NamedOrBlankNode) -> impl Iterator<Item = &'a Statement> + 'a {
        self.by_subject
            .get(node)
            .into_iter()
            .flatten()
            .map(move |&index| &self.statements[index])
    }

    /// Every subject, in first-seen order.
    pub fn subjects(&self) -> Vec<NamedOrBlankNode> {
        let mut seen = HashSet::new();
        self.statements
            .iter()
            .filter(|st| seen.insert(st.subject.clone()))
            .map(|st| st.subject.clone())
            .collect()
    }

    /// Subjects typed (`rdf:type`) with any of `types`, in first-seen order.
    /// With no types, every subject is a candidate.
    pub fn nodes_of_types(&self, types: &[NamedNode]) -> Vec<NamedOrBlankNode> {
        if types.is_empty() {
            return self.subjects();
        }
        let mut seen = HashSet::new();
        self.statements
            .iter()
            .filter(|st| {
                st.predicate.as_ref() == rdf::TYPE
                    && matches!(&st.object, Term::NamedNode(class) if types.contains(class))
            })
            .filter(|st| seen.insert(st.subject.clone()))
            .map(|st| st.subject.clone())
            .collect()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

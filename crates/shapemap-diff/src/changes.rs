use std::collections::HashSet;

use shapemap_store::{statements_of_node, TripleStore};
use shapemap_types::{
    dedup_statements, node_to_term, term_to_node, DataTree, NamedNode, NamedOrBlankNode, NodeAllocator, Statement,
    Term,
};
use tracing::debug;

use crate::error::{DiffError, DiffResult};

/// Current statements that conflict with the proposed inserts.
///
/// For every proposed statement, each stored statement sharing its subject,
/// predicate, and graph is retracted unless it is itself proposed.
pub fn deletes_for_insert(store: &dyn TripleStore, inserts: &[Statement]) -> DiffResult<Vec<Statement>> {
    let proposed: HashSet<&Statement> = inserts.iter().collect();
    let mut deletes = Vec::new();
    for st in inserts {
        for old in store.match_pattern(Some(&st.subject), Some(&st.predicate), None, Some(&st.graph))? {
            if !proposed.contains(&old) {
                deletes.push(old);
            }
        }
    }
    Ok(dedup_statements(deletes))
}

/// Statements to retract for the top-level fields of `absolute` that hold
/// an empty value.
///
/// Every object currently bound to `(subject, field)` in `document` is
/// removed together with every link pointing at it and the sub-tree it
/// owns (see [`statements_of_node`]). `subject` itself is never walked into.
pub fn deletes_for_empty_values(
    store: &dyn TripleStore,
    absolute: &DataTree,
    subject: &NamedOrBlankNode,
    document: &NamedNode,
    allocator: &NodeAllocator,
) -> DiffResult<Vec<Statement>> {
    let mut deletes = Vec::new();
    for (key, value) in absolute.fields.iter().filter(|(_, value)| value.is_empty()) {
        let predicate = NamedNode::new(key.as_str()).map_err(|e| DiffError::InvalidPredicate {
            predicate: key.clone(),
            reason: e.to_string(),
        })?;
        for object in store.objects(subject, &predicate, Some(document))? {
            match term_to_node(&object) {
                Some(node) => deletes.extend(statements_of_node(store, &node, document, Some(subject), allocator)?),
                None => deletes.push(literal_statement(subject, &predicate, object, document)),
            }
        }
    }
    Ok(dedup_statements(deletes))
}

/// Sub-trees left unreachable by `deletes`.
///
/// A blank or minted node whose every incoming link is being deleted, and
/// which no proposed statement links to again, is retracted with the
/// sub-tree it owns. Replacing a list of id-less objects therefore does not
/// leave the old elements behind.
pub fn deletes_for_orphans(
    store: &dyn TripleStore,
    deletes: &[Statement],
    proposed: &[Statement],
    document: &NamedNode,
    allocator: &NodeAllocator,
) -> DiffResult<Vec<Statement>> {
    let deleted: HashSet<&Statement> = deletes.iter().collect();
    let relinked: HashSet<&Term> = proposed.iter().map(|st| &st.object).collect();
    let mut orphans = Vec::new();
    for st in deletes.iter().filter(|st| &st.graph == document) {
        let Some(child) = st.object_node() else {
            continue;
        };
        let owned = match &child {
            NamedOrBlankNode::BlankNode(_) => true,
            NamedOrBlankNode::NamedNode(iri) => allocator.is_minted(iri),
        };
        let term = node_to_term(&child);
        if !owned || relinked.contains(&term) {
            continue;
        }
        let referrers = store.match_pattern(None, None, Some(&term), Some(document))?;
        if referrers.iter().all(|r| deleted.contains(r)) {
            orphans.extend(statements_of_node(store, &child, document, Some(&st.subject), allocator)?);
        }
    }
    Ok(dedup_statements(orphans))
}

fn literal_statement(subject: &NamedOrBlankNode, predicate: &NamedNode, object: Term, document: &NamedNode) -> Statement {
    Statement::new(subject.clone(), predicate.clone(), object, document.clone())
}

/// The deletes and inserts that move a document to a proposed state.
///
/// Applying a change set removes first, then inserts; transports apply both
/// halves together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub deletes: Vec<Statement>,
    pub inserts: Vec<Statement>,
}

impl ChangeSet {
    /// Compute the change set for writing `absolute` as `proposed`.
    ///
    /// Deletes are the union of [`deletes_for_insert`] against the full
    /// proposed set, the orphans those leave behind, and
    /// [`deletes_for_empty_values`]; a proposed statement is never deleted.
    /// Inserts are the proposed statements not already stored.
    pub fn compute(
        store: &dyn TripleStore,
        proposed: &[Statement],
        absolute: &DataTree,
        subject: &NamedOrBlankNode,
        document: &NamedNode,
        allocator: &NodeAllocator,
    ) -> DiffResult<Self> {
        let proposed_set: HashSet<&Statement> = proposed.iter().collect();
        let mut deletes = deletes_for_insert(store, proposed)?;
        let orphans = deletes_for_orphans(store, &deletes, proposed, document, allocator)?;
        deletes.extend(orphans);
        deletes.extend(deletes_for_empty_values(store, absolute, subject, document, allocator)?);
        let deletes: Vec<Statement> = dedup_statements(deletes)
            .into_iter()
            .filter(|st| !proposed_set.contains(st))
            .collect();

        let mut inserts = Vec::new();
        for st in proposed {
            if !store.contains(st)? {
                inserts.push(st.clone());
            }
        }

        debug!(
            subject = %subject,
            document = %document,
            deletes = deletes.len(),
            inserts = inserts.len(),
            "computed change set"
        );
        Ok(Self { deletes, inserts })
    }

    /// A change set that only deletes.
    pub fn deletes_only(deletes: Vec<Statement>) -> Self {
        Self {
            deletes,
            inserts: Vec::new(),
        }
    }

    /// Remove the deletes from `store`, then insert the inserts.
    pub fn apply_to(&self, store: &dyn TripleStore) -> DiffResult<()> {
        store.remove_all(&self.deletes)?;
        store.insert_all(&self.inserts)?;
        Ok(())
    }

    /// Returns `true` if the change set has nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty()
    }

    /// Total number of statements touched.
    pub fn len(&self) -> usize {
        self.deletes.len() + self.inserts.len()
    }
}

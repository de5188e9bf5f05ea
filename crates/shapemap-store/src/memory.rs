use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use shapemap_types::{NamedNode, NamedOrBlankNode, Statement, Term};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::TripleStore;

#[derive(Default)]
struct Inner {
    order: Vec<Statement>,
    index: HashSet<Statement>,
}

/// In-memory triple store.
///
/// Intended for tests and embedding. Statements are kept in insertion order
/// behind a `RwLock`, with a hash index for membership checks.
#[derive(Default)]
pub struct InMemoryTripleStore {
    inner: RwLock<Inner>,
}

impl InMemoryTripleStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with statements.
    pub fn from_statements(statements: impl IntoIterator<Item = Statement>) -> Self {
        let mut inner = Inner::default();
        for st in statements {
            if inner.index.insert(st.clone()) {
                inner.order.push(st);
            }
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// A copy of every statement, in insertion order.
    pub fn statements(&self) -> StoreResult<Vec<Statement>> {
        Ok(self.read()?.order.clone())
    }

    /// Remove all statements from the store.
    pub fn clear(&self) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.order.clear();
        inner.index.clear();
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

fn matches(
    st: &Statement,
    subject: Option<&NamedOrBlankNode>,
    predicate: Option<&NamedNode>,
    object: Option<&Term>,
    graph: Option<&NamedNode>,
) -> bool {
    subject.map_or(true, |s| &st.subject == s)
        && predicate.map_or(true, |p| &st.predicate == p)
        && object.map_or(true, |o| &st.object == o)
        && graph.map_or(true, |g| &st.graph == g)
}

impl TripleStore for InMemoryTripleStore {
    fn match_pattern(
        &self,
        subject: Option<&NamedOrBlankNode>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        graph: Option<&NamedNode>,
    ) -> StoreResult<Vec<Statement>> {
        let inner = self.read()?;
        Ok(inner
            .order
            .iter()
            .filter(|st| matches(st, subject, predicate, object, graph))
            .cloned()
            .collect())
    }

    fn contains(&self, statement: &Statement) -> StoreResult<bool> {
        Ok(self.read()?.index.contains(statement))
    }

    fn insert(&self, statement: &Statement) -> StoreResult<bool> {
        let mut inner = self.write()?;
        if !inner.index.insert(statement.clone()) {
            return Ok(false);
        }
        inner.order.push(statement.clone());
        Ok(true)
    }

    fn remove(&self, statement: &Statement) -> StoreResult<bool> {
        let mut inner = self.write()?;
        if !inner.index.remove(statement) {
            return Ok(false);
        }
        inner.order.retain(|st| st != statement);
        Ok(true)
    }

    fn remove_document(&self, document: &NamedNode) -> StoreResult<usize> {
        let mut inner = self.write()?;
        let before = inner.order.len();
        inner.order.retain(|st| &st.graph != document);
        inner.index.retain(|st| &st.graph != document);
        let removed = before - inner.order.len();
        debug!(document = %document, removed, "cleared document");
        Ok(removed)
    }

    fn documents(&self) -> StoreResult<Vec<NamedNode>> {
        let inner = self.read()?;
        let mut seen = HashSet::new();
        Ok(inner
            .order
            .iter()
            .filter(|st| seen.insert(st.graph.clone()))
            .map(|st| st.graph.clone())
            .collect())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.order.len())
    }
}

impl std::fmt::Debug for InMemoryTripleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryTripleStore")
            .field("statement_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapemap_types::Literal;

    const DOC: &str = "https://pod.example/chat";
    const OTHER: &str = "https://pod.example/other";

    fn nn(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    fn st(subject: &str, predicate: &str, value: &str, doc: &str) -> Statement {
        Statement::new(
            nn(subject),
            nn(predicate),
            Literal::new_simple_literal(value),
            nn(doc),
        )
    }

    fn title(value: &str) -> Statement {
        st(
            "https://pod.example/chat#this",
            "http://purl.org/dc/elements/1.1/title",
            value,
            DOC,
        )
    }

    // -----------------------------------------------------------------------
    // Core insert / remove
    // -----------------------------------------------------------------------

    #[test]
    fn insert_and_contains() {
        let store = InMemoryTripleStore::new();
        assert!(store.insert(&title("Chat")).unwrap());
        assert!(store.contains(&title("Chat")).unwrap());
        assert!(!store.contains(&title("Other")).unwrap());
    }

    #[test]
    fn insert_is_idempotent() {
        let store = InMemoryTripleStore::new();
        assert!(store.insert(&title("Chat")).unwrap());
        assert!(!store.insert(&title("Chat")).unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn remove_present_and_missing() {
        let store = InMemoryTripleStore::new();
        store.insert(&title("Chat")).unwrap();
        assert!(store.remove(&title("Chat")).unwrap());
        assert!(!store.remove(&title("Chat")).unwrap());
        assert!(store.is_empty().unwrap());
    }

    // -----------------------------------------------------------------------
    // Pattern matching
    // -----------------------------------------------------------------------

    #[test]
    fn match_by_subject_and_predicate() {
        let store = InMemoryTripleStore::from_statements(vec![
            title("Chat"),
            st("https://pod.example/chat#this", "http://purl.org/dc/elements/1.1/author", "x", DOC),
            st("https://pod.example/chat#other", "http://purl.org/dc/elements/1.1/title", "y", DOC),
        ]);
        let subject = NamedOrBlankNode::from(nn("https://pod.example/chat#this"));
        let found = store
            .match_pattern(Some(&subject), Some(&nn("http://purl.org/dc/elements/1.1/title")), None, None)
            .unwrap();
        assert_eq!(found, vec![title("Chat")]);
    }

    #[test]
    fn match_wildcards_preserve_insertion_order() {
        let a = title("A");
        let b = title("B");
        let store = InMemoryTripleStore::from_statements(vec![a.clone(), b.clone()]);
        assert_eq!(store.match_pattern(None, None, None, None).unwrap(), vec![a, b]);
    }

    #[test]
    fn match_by_graph() {
        let store = InMemoryTripleStore::from_statements(vec![
            title("Chat"),
            st("https://pod.example/other#x", "http://purl.org/dc/elements/1.1/title", "z", OTHER),
        ]);
        assert_eq!(store.document_statements(&nn(DOC)).unwrap(), vec![title("Chat")]);
    }

    #[test]
    fn any_object_scoped_to_document() {
        let store = InMemoryTripleStore::from_statements(vec![
            st("https://pod.example/chat#this", "http://purl.org/dc/elements/1.1/title", "elsewhere", OTHER),
        ]);
        let subject = NamedOrBlankNode::from(nn("https://pod.example/chat#this"));
        let predicate = nn("http://purl.org/dc/elements/1.1/title");
        assert!(store.any_object(&subject, &predicate, Some(&nn(DOC))).unwrap().is_none());
        assert!(store.any_object(&subject, &predicate, None).unwrap().is_some());
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    #[test]
    fn remove_document_leaves_other_documents() {
        let other = st("https://pod.example/other#x", "http://purl.org/dc/elements/1.1/title", "z", OTHER);
        let store = InMemoryTripleStore::from_statements(vec![title("A"), title("B"), other.clone()]);
        assert_eq!(store.remove_document(&nn(DOC)).unwrap(), 2);
        assert_eq!(store.statements().unwrap(), vec![other]);
    }

    #[test]
    fn replace_document_swaps_contents() {
        let store = InMemoryTripleStore::from_statements(vec![title("Old")]);
        store.replace_document(&nn(DOC), &[title("New")]).unwrap();
        assert_eq!(store.statements().unwrap(), vec![title("New")]);
    }

    #[test]
    fn replace_document_rejects_foreign_statements() {
        let store = InMemoryTripleStore::from_statements(vec![title("Old")]);
        let foreign = st("https://pod.example/other#x", "http://purl.org/dc/elements/1.1/title", "z", OTHER);
        let err = store.replace_document(&nn(DOC), &[foreign]).unwrap_err();
        assert!(matches!(err, StoreError::ForeignStatement { .. }));
        // Untouched on failure.
        assert_eq!(store.statements().unwrap(), vec![title("Old")]);
    }

    #[test]
    fn documents_are_listed_once() {
        let store = InMemoryTripleStore::from_statements(vec![
            title("A"),
            title("B"),
            st("https://pod.example/other#x", "http://purl.org/dc/elements/1.1/title", "z", OTHER),
        ]);
        assert_eq!(store.documents().unwrap(), vec![nn(DOC), nn(OTHER)]);
    }

    #[test]
    fn holds_subject_in_document() {
        let store = InMemoryTripleStore::from_statements(vec![title("A")]);
        let subject = NamedOrBlankNode::from(nn("https://pod.example/chat#this"));
        assert!(store.holds_subject(&subject, &nn(DOC)).unwrap());
        assert!(!store.holds_subject(&subject, &nn(OTHER)).unwrap());
    }

    #[test]
    fn clear_removes_all() {
        let store = InMemoryTripleStore::from_statements(vec![title("A"), title("B")]);
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn debug_format() {
        let store = InMemoryTripleStore::from_statements(vec![title("A")]);
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryTripleStore"));
        assert!(debug.contains("statement_count"));
    }
}

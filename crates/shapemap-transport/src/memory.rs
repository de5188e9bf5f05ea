use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use shapemap_types::{NamedNode, Statement};
use tracing::{debug, warn};

use crate::error::{TransportError, TransportResult};
use crate::traits::{FetchResponse, Transport};

/// A write received by an [`InMemoryTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteRecord {
    Update {
        deletes: Vec<Statement>,
        inserts: Vec<Statement>,
    },
    Put {
        uri: NamedNode,
        statements: Vec<Statement>,
        content_type: String,
    },
}

#[derive(Default)]
struct PodState {
    documents: HashMap<NamedNode, Vec<Statement>>,
    failing_fetches: HashMap<NamedNode, u16>,
    writes: Vec<WriteRecord>,
}

/// In-memory stand-in for a remote pod.
///
/// Documents are kept as ordered statement lists. Patches are strict: every
/// deleted statement must exist, otherwise the whole patch is refused and
/// nothing changes. Call counters and failure injection let tests assert
/// which requests were (or were not) issued.
#[derive(Default)]
pub struct InMemoryTransport {
    state: RwLock<PodState>,
    fetches: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the pod with statements, grouped into documents by their graph.
    pub fn with_statements(statements: impl IntoIterator<Item = Statement>) -> Self {
        let transport = Self::new();
        if let Ok(mut state) = transport.state.write() {
            for st in statements {
                let document = state.documents.entry(st.graph.clone()).or_default();
                if !document.contains(&st) {
                    document.push(st);
                }
            }
        }
        transport
    }

    /// Every statement of a document, or `None` if it does not exist.
    pub fn document(&self, uri: &NamedNode) -> TransportResult<Option<Vec<Statement>>> {
        Ok(self.read()?.documents.get(uri).cloned())
    }

    /// Number of `fetch` calls received.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `update` and `put` calls received, including refused ones.
    pub fn write_count(&self) -> usize {
        self.read().map(|state| state.writes.len()).unwrap_or_default()
    }

    /// Every write received, in order.
    pub fn writes(&self) -> TransportResult<Vec<WriteRecord>> {
        Ok(self.read()?.writes.clone())
    }

    /// Refuse every subsequent write.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Answer fetches of `uri` with `status`.
    pub fn fail_fetch(&self, uri: &NamedNode, status: u16) -> TransportResult<()> {
        self.write()?.failing_fetches.insert(uri.clone(), status);
        Ok(())
    }

    fn refuse_write(&self) -> TransportResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            warn!("refusing write");
            return Err(TransportError::WriteRejected("writes disabled".into()));
        }
        Ok(())
    }

    fn read(&self) -> TransportResult<RwLockReadGuard<'_, PodState>> {
        self.state
            .read()
            .map_err(|e| TransportError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> TransportResult<RwLockWriteGuard<'_, PodState>> {
        self.state
            .write()
            .map_err(|e| TransportError::LockPoisoned(e.to_string()))
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn fetch(&self, uri: &NamedNode) -> TransportResult<FetchResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.read()?;
        if let Some(&status) = state.failing_fetches.get(uri) {
            return Err(TransportError::Status {
                uri: uri.as_str().to_string(),
                status,
            });
        }
        let response = match state.documents.get(uri) {
            Some(statements) => FetchResponse::ok(statements.clone()),
            None => FetchResponse::not_found(),
        };
        debug!(uri = uri.as_str(), status = response.status, statements = response.statements.len(), "fetched");
        Ok(response)
    }

    async fn update(&self, deletes: &[Statement], inserts: &[Statement]) -> TransportResult<()> {
        let mut state = self.write()?;
        state.writes.push(WriteRecord::Update {
            deletes: deletes.to_vec(),
            inserts: inserts.to_vec(),
        });
        self.refuse_write()?;

        if let Some(missing) = deletes.iter().find(|st| {
            state
                .documents
                .get(&st.graph)
                .map_or(true, |document| !document.contains(st))
        }) {
            return Err(TransportError::MissingStatement(Box::new(missing.clone())));
        }

        let removed: HashSet<&Statement> = deletes.iter().collect();
        for document in state.documents.values_mut() {
            document.retain(|st| !removed.contains(st));
        }
        for st in inserts {
            let document = state.documents.entry(st.graph.clone()).or_default();
            if !document.contains(st) {
                document.push(st.clone());
            }
        }
        debug!(deletes = deletes.len(), inserts = inserts.len(), "patched");
        Ok(())
    }

    async fn put(&self, uri: &NamedNode, statements: &[Statement], content_type: &str) -> TransportResult<()> {
        let mut state = self.write()?;
        state.writes.push(WriteRecord::Put {
            uri: uri.clone(),
            statements: statements.to_vec(),
            content_type: content_type.to_string(),
        });
        self.refuse_write()?;

        if let Some(foreign) = statements.iter().find(|st| &st.graph != uri) {
            return Err(TransportError::ForeignStatement {
                statement: Box::new(foreign.clone()),
                document: uri.as_str().to_string(),
            });
        }
        let mut document: Vec<Statement> = Vec::with_capacity(statements.len());
        for st in statements {
            if !document.contains(st) {
                document.push(st.clone());
            }
        }
        debug!(uri = uri.as_str(), statements = document.len(), content_type, "replaced");
        state.documents.insert(uri.clone(), document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapemap_types::Literal;

    const DOC: &str = "https://pod.example/chat";
    const TITLE: &str = "http://purl.org/dc/elements/1.1/title";

    fn nn(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    fn title(doc: &str, value: &str) -> Statement {
        Statement::new(
            nn(&format!("{doc}#this")),
            nn(TITLE),
            Literal::new_simple_literal(value),
            nn(doc),
        )
    }

    // -----------------------------------------------------------------------
    // Fetch
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let transport = InMemoryTransport::new();
        let response = transport.fetch(&nn(DOC)).await.unwrap();
        assert!(response.is_not_found());
        assert!(response.statements.is_empty());
        assert_eq!(transport.fetch_count(), 1);
    }

    #[tokio::test]
    async fn seeded_documents_are_fetched() {
        let transport = InMemoryTransport::with_statements([title(DOC, "a"), title("https://pod.example/other", "b")]);
        let response = transport.fetch(&nn(DOC)).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.statements, vec![title(DOC, "a")]);
    }

    #[tokio::test]
    async fn injected_fetch_failure() {
        let transport = InMemoryTransport::new();
        transport.fail_fetch(&nn(DOC), 500).unwrap();
        let err = transport.fetch(&nn(DOC)).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 500, .. }));
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn update_deletes_then_inserts() {
        let transport = InMemoryTransport::with_statements([title(DOC, "old")]);
        transport
            .update(&[title(DOC, "old")], &[title(DOC, "new")])
            .await
            .unwrap();
        assert_eq!(transport.document(&nn(DOC)).unwrap(), Some(vec![title(DOC, "new")]));
        assert_eq!(transport.write_count(), 1);
    }

    #[tokio::test]
    async fn update_with_missing_delete_changes_nothing() {
        let transport = InMemoryTransport::with_statements([title(DOC, "old")]);
        let err = transport
            .update(&[title(DOC, "ghost")], &[title(DOC, "new")])
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::MissingStatement(_)));
        assert_eq!(transport.document(&nn(DOC)).unwrap(), Some(vec![title(DOC, "old")]));
    }

    #[tokio::test]
    async fn put_replaces_document() {
        let transport = InMemoryTransport::with_statements([title(DOC, "old")]);
        transport.put(&nn(DOC), &[title(DOC, "new")], "text/turtle").await.unwrap();
        assert_eq!(transport.document(&nn(DOC)).unwrap(), Some(vec![title(DOC, "new")]));
        match &transport.writes().unwrap()[0] {
            WriteRecord::Put { content_type, .. } => assert_eq!(content_type, "text/turtle"),
            other => panic!("unexpected write {other:?}"),
        }
    }

    #[tokio::test]
    async fn put_rejects_foreign_statements() {
        let transport = InMemoryTransport::new();
        let err = transport
            .put(&nn(DOC), &[title("https://pod.example/other", "x")], "text/turtle")
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::ForeignStatement { .. }));
        assert_eq!(transport.document(&nn(DOC)).unwrap(), None);
    }

    #[tokio::test]
    async fn refused_writes_are_counted_but_not_applied() {
        let transport = InMemoryTransport::new();
        transport.fail_writes(true);
        assert!(transport.put(&nn(DOC), &[title(DOC, "x")], "text/turtle").await.is_err());
        assert_eq!(transport.write_count(), 1);
        assert_eq!(transport.document(&nn(DOC)).unwrap(), None);
    }
}

use std::sync::Arc;

use futures::future::try_join_all;
use shapemap_diff::ChangeSet;
use shapemap_store::{InMemoryTripleStore, TripleStore};
use shapemap_transform::{normalized_to_absolute, StatementSynthesizer};
use shapemap_transport::Transport;
use shapemap_types::{DataTree, NamedNode, NamedOrBlankNode, NodeAllocator, Statement, TypeError};
use shapemap_validate::{node_label, ShapedObject, ValidationOrchestrator, ValidationReport};
use tracing::{debug, info, warn};

use crate::config::ShapeConfig;
use crate::descriptor::ShapeDescriptor;
use crate::error::{ShapeError, ShapeResult};
use crate::query::{Delete, DocRef, FindAll, FindOne, QueryResult, Write};

type Outcome<T> = (Option<T>, Option<Vec<String>>);

/// CRUD over the instances of one shape.
///
/// Every operation fetches the documents it touches into the local store
/// first. Writes are validated against the prospective state of the
/// document before anything is sent to the transport, so a rejected write
/// never reaches the remote.
///
/// Operations are not serialized against each other: two concurrent
/// `create` calls for the same id can both pass the existence check.
pub struct Shape {
    descriptor: ShapeDescriptor,
    store: Arc<dyn TripleStore>,
    transport: Arc<dyn Transport>,
    config: ShapeConfig,
    synthesizer: StatementSynthesizer,
}

impl Shape {
    pub fn new(descriptor: ShapeDescriptor, store: Arc<dyn TripleStore>, transport: Arc<dyn Transport>) -> Self {
        Self::with_config(descriptor, store, transport, ShapeConfig::default())
    }

    pub fn with_config(
        descriptor: ShapeDescriptor,
        store: Arc<dyn TripleStore>,
        transport: Arc<dyn Transport>,
        config: ShapeConfig,
    ) -> Self {
        let synthesizer = StatementSynthesizer::new(NodeAllocator::new(config.id_fragment_prefix.clone()));
        Self {
            descriptor,
            store,
            transport,
            config,
            synthesizer,
        }
    }

    pub fn descriptor(&self) -> &ShapeDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> &ShapeConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn TripleStore {
        self.store.as_ref()
    }

    // ---- Read operations ----

    /// Read one node: the given id, or the first instance of the shape's
    /// types across the documents.
    pub async fn find_one(&self, args: FindOne) -> QueryResult<ShapedObject> {
        let doc = args.doc.clone();
        let outcome = self.try_find_one(args).await;
        self.finish("find_one", doc, outcome)
    }

    /// Read every instance (or the given ids) across the documents, keeping
    /// those that match every filter.
    pub async fn find_all(&self, args: FindAll) -> QueryResult<Vec<ShapedObject>> {
        let doc = args.doc.clone();
        let outcome = self.try_find_all(args).await;
        self.finish("find_all", doc, outcome)
    }

    async fn try_find_one(&self, args: FindOne) -> ShapeResult<Outcome<ShapedObject>> {
        let documents = args.doc.documents()?;
        self.load(&documents).await?;
        let ids = args.id.map(|id| vec![id]);
        let (shapes, errors) = self.validate(self.store.as_ref(), &documents, ids.as_deref())?.into_parts();
        Ok((shapes.and_then(|shapes| shapes.into_iter().next()), errors))
    }

    async fn try_find_all(&self, args: FindAll) -> ShapeResult<Outcome<Vec<ShapedObject>>> {
        let documents = args.doc.documents()?;
        self.load(&documents).await?;
        let (shapes, errors) = self
            .validate(self.store.as_ref(), &documents, args.ids.as_deref())?
            .into_parts();
        let shapes = shapes.map(|shapes| {
            shapes
                .into_iter()
                .filter(|shape| args.filters.iter().all(|(key, value)| shape.matches(key, value)))
                .collect::<Vec<ShapedObject>>()
        });
        Ok((shapes, errors))
    }

    // ---- Write operations ----

    /// Create a new node in a document.
    ///
    /// Fails without writing if the id is already a subject in the document
    /// or the document would not conform afterwards. A document that does
    /// not exist yet is written in full; an existing one is patched.
    pub async fn create(&self, args: Write) -> QueryResult<ShapedObject> {
        let doc = DocRef::from(args.doc.clone());
        let outcome = self.try_create(args).await;
        self.finish("create", doc, outcome)
    }

    /// Update fields of an existing node. Fields absent from the data are
    /// left alone; fields set to an empty value are retracted with
    /// everything hanging off them.
    pub async fn update(&self, args: Write) -> QueryResult<ShapedObject> {
        let doc = DocRef::from(args.doc.clone());
        let outcome = self.try_update(args).await;
        self.finish("update", doc, outcome)
    }

    /// Delete every statement with the id as subject. Deleting an unknown
    /// id succeeds without writing.
    pub async fn delete(&self, args: Delete) -> QueryResult<()> {
        let doc = DocRef::from(args.doc.clone());
        let outcome = self.try_delete(args).await.map(|()| (None, None));
        self.finish("delete", doc, outcome)
    }

    /// The change set that writing `data` into `doc` would apply, computed
    /// against the local store without fetching.
    pub fn data_to_statements(&self, data: &DataTree, doc: &str) -> ShapeResult<ChangeSet> {
        let document = Statement::document(doc)?;
        let subject = self.subject_of(data, &document);
        self.change_set(data, &subject, &document)
    }

    async fn try_create(&self, args: Write) -> ShapeResult<Outcome<ShapedObject>> {
        let document = Statement::document(&args.doc)?;
        let exists = self.load_one(&document).await?;
        let subject = self.subject_of(&args.data, &document);
        if self.store.holds_subject(&subject, &document)? {
            return Err(ShapeError::AlreadyExists {
                id: node_label(&subject),
                doc: args.doc,
            });
        }

        let absolute = normalized_to_absolute(&args.data, self.descriptor.contexts())?;
        let proposed = self
            .synthesizer
            .synthesize_for(self.store.as_ref(), &absolute, &subject, &document)?;
        let mut inserts = Vec::with_capacity(proposed.len());
        for st in proposed {
            if !self.store.contains(&st)? {
                inserts.push(st);
            }
        }
        let changes = ChangeSet {
            deletes: Vec::new(),
            inserts,
        };

        let prospective = self.prospective(&document, &changes)?;
        let report = self.validate_node(&prospective, &document, &subject)?;
        if !report.is_valid() {
            warn!(shape = self.descriptor.id(), node = %subject, "create rejected by validation");
            return Ok((None, report.into_parts().1));
        }

        if exists {
            self.transport.update(&changes.deletes, &changes.inserts).await?;
            changes.apply_to(self.store.as_ref())?;
        } else {
            let statements = prospective.document_statements(&document)?;
            self.transport
                .put(&document, &statements, &self.config.content_type)
                .await?;
            self.store.replace_document(&document, &statements)?;
        }
        info!(shape = self.descriptor.id(), node = %subject, document = %document, new_document = !exists, "created");
        self.written(report, &document, &subject)
    }

    async fn try_update(&self, args: Write) -> ShapeResult<Outcome<ShapedObject>> {
        let document = Statement::document(&args.doc)?;
        let id = args.data.id.as_ref().ok_or_else(|| ShapeError::MissingId(args.doc.clone()))?;
        self.load_one(&document).await?;
        let subject = self.synthesizer.allocator().allocate(&document, Some(id));
        if !self.store.holds_subject(&subject, &document)? {
            return Err(ShapeError::DoesNotExist {
                id: id.as_str().to_string(),
                doc: args.doc,
            });
        }

        let changes = self.change_set(&args.data, &subject, &document)?;
        let prospective = self.prospective(&document, &changes)?;
        let report = self.validate_node(&prospective, &document, &subject)?;
        if !report.is_valid() {
            warn!(shape = self.descriptor.id(), node = %subject, "update rejected by validation");
            return Ok((None, report.into_parts().1));
        }

        if changes.is_empty() {
            debug!(node = %subject, "update changes nothing");
        } else {
            self.transport.update(&changes.deletes, &changes.inserts).await?;
            changes.apply_to(self.store.as_ref())?;
        }
        info!(
            shape = self.descriptor.id(),
            node = %subject,
            deletes = changes.deletes.len(),
            inserts = changes.inserts.len(),
            "updated"
        );
        self.written(report, &document, &subject)
    }

    async fn try_delete(&self, args: Delete) -> ShapeResult<()> {
        let document = Statement::document(&args.doc)?;
        let subject: NamedOrBlankNode = NamedNode::new(args.id.as_str())
            .map_err(|e| TypeError::InvalidIri {
                iri: args.id.clone(),
                reason: e.to_string(),
            })?
            .into();
        self.load_one(&document).await?;
        let statements = self.store.match_pattern(Some(&subject), None, None, Some(&document))?;
        if statements.is_empty() {
            debug!(node = %subject, document = %document, "nothing to delete");
            return Ok(());
        }
        self.transport.update(&statements, &[]).await?;
        self.store.remove_all(&statements)?;
        info!(node = %subject, document = %document, statements = statements.len(), "deleted");
        Ok(())
    }

    // ---- Internals ----

    /// Fetch documents jointly and mirror them into the local store.
    /// Returns, per document, whether it exists.
    async fn load(&self, documents: &[NamedNode]) -> ShapeResult<Vec<bool>> {
        let responses = try_join_all(documents.iter().map(|doc| self.transport.fetch(doc))).await?;
        let mut existing = Vec::with_capacity(documents.len());
        for (document, response) in documents.iter().zip(responses) {
            if response.is_not_found() {
                self.store.remove_document(document)?;
                existing.push(false);
            } else {
                self.store.replace_document(document, &response.statements)?;
                existing.push(true);
            }
            debug!(document = %document, status = response.status, "loaded");
        }
        Ok(existing)
    }

    async fn load_one(&self, document: &NamedNode) -> ShapeResult<bool> {
        let existing = self.load(std::slice::from_ref(document)).await?;
        Ok(existing.first().copied().unwrap_or(false))
    }

    fn subject_of(&self, data: &DataTree, document: &NamedNode) -> NamedOrBlankNode {
        self.synthesizer.allocator().allocate(document, data.id.as_ref())
    }

    fn change_set(&self, data: &DataTree, subject: &NamedOrBlankNode, document: &NamedNode) -> ShapeResult<ChangeSet> {
        let absolute = normalized_to_absolute(data, self.descriptor.contexts())?;
        let proposed = self
            .synthesizer
            .synthesize_for(self.store.as_ref(), &absolute, subject, document)?;
        Ok(ChangeSet::compute(
            self.store.as_ref(),
            &proposed,
            &absolute,
            subject,
            document,
            self.synthesizer.allocator(),
        )?)
    }

    /// The document as it would be after applying `changes`.
    fn prospective(&self, document: &NamedNode, changes: &ChangeSet) -> ShapeResult<InMemoryTripleStore> {
        let store = InMemoryTripleStore::from_statements(self.store.document_statements(document)?);
        changes.apply_to(&store)?;
        Ok(store)
    }

    fn validate(
        &self,
        store: &dyn TripleStore,
        documents: &[NamedNode],
        ids: Option<&[String]>,
    ) -> ShapeResult<ValidationReport> {
        let orchestrator = ValidationOrchestrator::new(
            self.descriptor.validator(),
            self.descriptor.id(),
            self.descriptor.types(),
            self.descriptor.contexts(),
            Arc::clone(self.descriptor.aliases()),
        );
        Ok(orchestrator.validate(store, documents, ids)?)
    }

    fn validate_node(
        &self,
        store: &dyn TripleStore,
        document: &NamedNode,
        subject: &NamedOrBlankNode,
    ) -> ShapeResult<ValidationReport> {
        let ids = [node_label(subject)];
        self.validate(store, std::slice::from_ref(document), Some(&ids))
    }

    /// The result of a successful write.
    fn written(
        &self,
        prospective: ValidationReport,
        document: &NamedNode,
        subject: &NamedOrBlankNode,
    ) -> ShapeResult<Outcome<ShapedObject>> {
        let report = if self.config.reproject_after_write {
            self.validate_node(self.store.as_ref(), document, subject)?
        } else {
            prospective
        };
        let (shapes, errors) = report.into_parts();
        Ok((shapes.and_then(|shapes| shapes.into_iter().next()), errors))
    }

    fn finish<T>(&self, operation: &str, doc: DocRef, outcome: ShapeResult<Outcome<T>>) -> QueryResult<T> {
        match outcome {
            Ok((data, errors)) => QueryResult::new(doc, data, errors),
            Err(err) => {
                warn!(shape = self.descriptor.id(), operation, %doc, error = %err, "operation failed");
                QueryResult::failed(doc, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use shapemap_store::InMemoryTripleStore;
    use shapemap_transport::{InMemoryTransport, WriteRecord};
    use shapemap_types::vocab::{rdf, xsd};
    use shapemap_types::{Literal, Term};
    use shapemap_validate::{ShapeDecl, ShapeSchema, TripleConstraint, ValueExpr};

    const CHAT_SHAPE: &str = "https://shaperepo.com/schemas/longChat#ChatShape";
    const PARTICIPATION_SHAPE: &str = "https://shaperepo.com/schemas/longChat#ChatParticipationShape";
    const DC: &str = "http://purl.org/dc/elements/1.1/";
    const MEETING: &str = "http://www.w3.org/ns/pim/meeting#";
    const FLOW: &str = "http://www.w3.org/2005/01/wf/flow#";
    const UI: &str = "http://www.w3.org/ns/ui#";
    const DOC: &str = "https://pod.example/chat";
    const CHAT: &str = "https://pod.example/chat#this";
    const PREFS: &str = "https://pod.example/chat#prefs";

    fn nn(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn schema() -> ShapeSchema {
        ShapeSchema::new()
            .with_prefix("dc", DC)
            .with_prefix("meeting", MEETING)
            .with_prefix("flow", FLOW)
            .with_prefix("ui", UI)
            .with_shape(
                CHAT_SHAPE,
                ShapeDecl::each_of([
                    TripleConstraint::new(
                        rdf::TYPE.into_owned(),
                        ValueExpr::ValueSet(vec![nn(&format!("{MEETING}LongChat")).into()]),
                    ),
                    TripleConstraint::new(nn(&format!("{DC}title")), ValueExpr::Datatype(xsd::STRING.into_owned())),
                    TripleConstraint::new(nn(&format!("{DC}author")), ValueExpr::Iri).optional(),
                    TripleConstraint::new(nn(&format!("{UI}sharedPreferences")), ValueExpr::Iri).optional(),
                    TripleConstraint::new(
                        nn(&format!("{FLOW}participation")),
                        ValueExpr::ShapeRef(PARTICIPATION_SHAPE.into()),
                    )
                    .zero_or_more(),
                ]),
            )
            .with_shape(
                PARTICIPATION_SHAPE,
                ShapeDecl::each_of([
                    TripleConstraint::new(nn(&format!("{FLOW}participant")), ValueExpr::Iri),
                    TripleConstraint::new(
                        nn(&format!("{UI}backgroundColor")),
                        ValueExpr::Datatype(xsd::STRING.into_owned()),
                    )
                    .optional(),
                ]),
            )
    }

    fn descriptor() -> ShapeDescriptor {
        ShapeDescriptor::builder(CHAT_SHAPE)
            .schema(schema())
            .types(["meeting:LongChat"])
            .context([
                ("type", "rdf:type"),
                ("title", "dc:title"),
                ("author", "dc:author"),
                ("sharedPreferences", "ui:sharedPreferences"),
                ("participation", "flow:participation"),
            ])
            .child_context([("participant", "flow:participant"), ("backgroundColor", "ui:backgroundColor")])
            .build()
            .unwrap()
    }

    fn chat_statements(doc: &str, subject: &str, title: &str) -> Vec<Statement> {
        vec![
            Statement::new(nn(subject), rdf::TYPE.into_owned(), nn(&format!("{MEETING}LongChat")), nn(doc)),
            Statement::new(
                nn(subject),
                nn(&format!("{DC}title")),
                Literal::new_simple_literal(title),
                nn(doc),
            ),
        ]
    }

    struct Fixture {
        shape: Shape,
        store: Arc<InMemoryTripleStore>,
        transport: Arc<InMemoryTransport>,
    }

    fn fixture_with(statements: Vec<Statement>, config: ShapeConfig) -> Fixture {
        init_tracing();
        let store = Arc::new(InMemoryTripleStore::new());
        let transport = Arc::new(InMemoryTransport::with_statements(statements));
        let shape = Shape::with_config(descriptor(), store.clone(), transport.clone(), config);
        Fixture { shape, store, transport }
    }

    fn fixture(statements: Vec<Statement>) -> Fixture {
        fixture_with(statements, ShapeConfig::default())
    }

    fn chat_data(title: &str) -> Value {
        json!({
            "id": CHAT,
            "type": format!("{MEETING}LongChat"),
            "title": title,
            "author": "https://alice.example/profile/card#me",
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn find_one_projects_fields() {
        let f = fixture(chat_statements(DOC, CHAT, "Chat"));
        let result = f.shape.find_one(FindOne::new(DOC).with_id(CHAT)).await;
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.doc, DocRef::One(DOC.into()));
        let chat = result.data.unwrap();
        assert_eq!(chat.id(), Some(CHAT));
        assert_eq!(chat.get_str("title"), Some("Chat"));
        assert_eq!(chat.get_str("dc:title"), Some("Chat"));
        assert_eq!(chat.get_str("type"), Some("http://www.w3.org/ns/pim/meeting#LongChat"));
    }

    #[tokio::test]
    async fn absolute_context_values_project_under_their_field() {
        init_tracing();
        let descriptor = ShapeDescriptor::builder(CHAT_SHAPE)
            .schema(schema())
            .types(["meeting:LongChat"])
            .context([("type", "rdf:type"), ("headline", "http://purl.org/dc/elements/1.1/title")])
            .build()
            .unwrap();
        let transport = Arc::new(InMemoryTransport::with_statements(chat_statements(DOC, CHAT, "Chat")));
        let shape = Shape::new(descriptor, Arc::new(InMemoryTripleStore::new()), transport);

        let result = shape.find_one(FindOne::new(DOC).with_id(CHAT)).await;
        assert!(result.is_ok(), "{:?}", result.errors);
        let chat = result.data.unwrap();
        assert_eq!(chat.get_str("headline"), Some("Chat"));
        assert_eq!(chat.get_str("http://purl.org/dc/elements/1.1/title"), Some("Chat"));

        let data = json!({ "id": CHAT, "headline": "Renamed" });
        let result = shape.update(Write::from_json(DOC, data).unwrap()).await;
        assert_eq!(result.data.and_then(|c| c.get_str("headline").map(str::to_string)), Some("Renamed".into()));
    }

    #[tokio::test]
    async fn find_one_without_id_takes_first_instance() {
        let f = fixture(chat_statements(DOC, CHAT, "Chat"));
        let result = f.shape.find_one(FindOne::new(DOC)).await;
        assert_eq!(result.data.and_then(|c| c.id().map(str::to_string)), Some(CHAT.to_string()));
    }

    #[tokio::test]
    async fn find_all_in_empty_document_reports_absence() {
        let f = fixture(Vec::new());
        let result = f.shape.find_all(FindAll::new(DOC)).await;
        assert!(result.data.is_none());
        assert_eq!(result.error_lines(), [format!("No shapes found of type {CHAT_SHAPE}")]);
    }

    #[tokio::test]
    async fn find_all_over_two_documents_does_not_leak() {
        let a = "https://pod.example/a";
        let b = "https://pod.example/b";
        let c = "https://pod.example/c";
        let mut statements = chat_statements(a, &format!("{a}#this"), "A");
        statements.extend(chat_statements(b, &format!("{b}#this"), "B"));
        statements.extend(chat_statements(c, &format!("{c}#this"), "C"));
        let f = fixture(statements);

        // Pull c into the local store first; it must stay out of scope.
        assert!(f.shape.find_all(FindAll::new(c)).await.is_ok());

        let result = f.shape.find_all(FindAll::new(vec![a, b])).await;
        assert_eq!(result.doc, DocRef::Many(vec![a.to_string(), b.to_string()]));
        let ids: Vec<String> = result
            .data
            .unwrap()
            .iter()
            .filter_map(|s| s.id().map(str::to_string))
            .collect();
        assert_eq!(ids, vec![format!("{a}#this"), format!("{b}#this")]);
        assert_eq!(f.transport.fetch_count(), 3);
    }

    #[tokio::test]
    async fn find_all_filters_on_projected_fields() {
        let mut statements = chat_statements(DOC, CHAT, "A");
        statements.extend(chat_statements(DOC, "https://pod.example/chat#other", "B"));
        let f = fixture(statements);
        let result = f.shape.find_all(FindAll::new(DOC).filter("dc:title", "B")).await;
        let data = result.data.unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].id(), Some("https://pod.example/chat#other"));
    }

    #[tokio::test]
    async fn find_all_with_no_matching_filter_is_empty_not_absent() {
        let f = fixture(chat_statements(DOC, CHAT, "A"));
        let result = f.shape.find_all(FindAll::new(DOC).filter("title", "Z")).await;
        assert!(result.is_ok());
        assert_eq!(result.data.as_ref().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn find_all_separates_nonconformant_nodes() {
        let mut statements = chat_statements(DOC, CHAT, "A");
        statements.push(Statement::new(
            nn("https://pod.example/chat#untitled"),
            rdf::TYPE.into_owned(),
            nn(&format!("{MEETING}LongChat")),
            nn(DOC),
        ));
        let f = fixture(statements);
        let result = f.shape.find_all(FindAll::new(DOC)).await;
        assert_eq!(result.data.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            result.error_lines(),
            [
                format!("validating https://pod.example/chat#untitled as {CHAT_SHAPE}:"),
                format!("    Missing property: {DC}title"),
            ]
        );
    }

    #[tokio::test]
    async fn fetch_failure_is_reported() {
        let f = fixture(Vec::new());
        f.transport.fail_fetch(&nn(DOC), 500).unwrap();
        let result = f.shape.find_one(FindOne::new(DOC).with_id(CHAT)).await;
        assert!(result.data.is_none());
        assert!(result.error_lines()[0].contains("status 500"));
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_in_new_document_puts_full_document() {
        let f = fixture(Vec::new());
        let result = f.shape.create(Write::from_json(DOC, chat_data("Chat")).unwrap()).await;
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.data.as_ref().and_then(|c| c.get_str("title")), Some("Chat"));

        let writes = f.transport.writes().unwrap();
        assert_eq!(writes.len(), 1);
        match &writes[0] {
            WriteRecord::Put {
                uri,
                statements,
                content_type,
            } => {
                assert_eq!(uri.as_str(), DOC);
                assert_eq!(statements.len(), 3);
                assert_eq!(content_type, "text/turtle");
            }
            other => panic!("unexpected write {other:?}"),
        }
        assert_eq!(f.store.len().unwrap(), 3);
    }

    #[tokio::test]
    async fn create_in_existing_document_patches() {
        let f = fixture(chat_statements(DOC, "https://pod.example/chat#other", "Other"));
        let result = f.shape.create(Write::from_json(DOC, chat_data("Chat")).unwrap()).await;
        assert!(result.is_ok(), "{:?}", result.errors);
        match &f.transport.writes().unwrap()[0] {
            WriteRecord::Update { deletes, inserts } => {
                assert!(deletes.is_empty());
                assert_eq!(inserts.len(), 3);
            }
            other => panic!("unexpected write {other:?}"),
        }
        assert_eq!(f.transport.document(&nn(DOC)).unwrap().map(|d| d.len()), Some(5));
    }

    #[tokio::test]
    async fn create_conflict_is_an_error_result() {
        let f = fixture(chat_statements(DOC, CHAT, "Existing"));
        let result = f.shape.create(Write::from_json(DOC, chat_data("Chat")).unwrap()).await;
        assert!(result.data.is_none());
        assert_eq!(
            result.errors,
            Some(vec![format!("Node with id: {CHAT} already exists in doc:{DOC}")])
        );
        assert_eq!(f.transport.write_count(), 0);
    }

    #[tokio::test]
    async fn create_rejected_by_validation_never_writes() {
        let f = fixture(Vec::new());
        let data = json!({ "id": CHAT, "type": format!("{MEETING}LongChat") });
        let result = f.shape.create(Write::from_json(DOC, data).unwrap()).await;
        assert!(result.data.is_none());
        assert!(result.error_lines().contains(&format!("    Missing property: {DC}title")));
        assert_eq!(f.transport.write_count(), 0);
        assert!(f.store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn create_with_unknown_field_fails_before_synthesis() {
        let f = fixture(Vec::new());
        let mut data = chat_data("Chat");
        data["bogus"] = json!(1);
        let result = f.shape.create(Write::from_json(DOC, data).unwrap()).await;
        assert!(result.error_lines()[0].starts_with("Key: bogus could not be found in context:"));
        assert_eq!(f.transport.write_count(), 0);
    }

    #[tokio::test]
    async fn create_mints_ids_for_nested_objects() {
        let config = ShapeConfig {
            id_fragment_prefix: "msg".into(),
            ..ShapeConfig::default()
        };
        let f = fixture_with(Vec::new(), config);
        let mut data = chat_data("Chat");
        data["participation"] = json!([{ "participant": "https://bob.example/profile/card#me" }]);
        let result = f.shape.create(Write::from_json(DOC, data).unwrap()).await;
        assert!(result.is_ok(), "{:?}", result.errors);
        let chat = result.data.unwrap();
        let participations = chat.nested_items("participation");
        assert_eq!(participations.len(), 1);
        assert!(participations[0].id().unwrap().starts_with("https://pod.example/chat#msg"));
        assert_eq!(
            participations[0].get_str("participant"),
            Some("https://bob.example/profile/card#me")
        );
    }

    #[tokio::test]
    async fn create_without_reprojection_returns_prospective_shape() {
        let config = ShapeConfig {
            reproject_after_write: false,
            ..ShapeConfig::default()
        };
        let f = fixture_with(Vec::new(), config);
        let result = f.shape.create(Write::from_json(DOC, chat_data("Chat")).unwrap()).await;
        assert_eq!(result.data.and_then(|c| c.get_str("title").map(str::to_string)), Some("Chat".into()));
    }

    #[tokio::test]
    async fn failed_write_leaves_local_store_untouched() {
        let f = fixture(Vec::new());
        f.transport.fail_writes(true);
        let result = f.shape.create(Write::from_json(DOC, chat_data("Chat")).unwrap()).await;
        assert_eq!(result.error_lines(), ["transport error: write rejected: writes disabled"]);
        assert!(f.store.is_empty().unwrap());
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn update_replaces_a_value() {
        let f = fixture(chat_statements(DOC, CHAT, "Old"));
        let data = json!({ "id": CHAT, "title": "New" });
        let result = f.shape.update(Write::from_json(DOC, data).unwrap()).await;
        assert_eq!(result.data.as_ref().and_then(|c| c.get_str("title")), Some("New"));
        let remote = f.transport.document(&nn(DOC)).unwrap().unwrap();
        assert!(remote.contains(&chat_statements(DOC, CHAT, "New")[1]));
        assert!(!remote.contains(&chat_statements(DOC, CHAT, "Old")[1]));
    }

    #[tokio::test]
    async fn update_to_empty_retracts_the_whole_object() {
        let mut statements = chat_statements(DOC, CHAT, "Chat");
        statements.push(Statement::new(
            nn(CHAT),
            nn(&format!("{UI}sharedPreferences")),
            nn(PREFS),
            nn(DOC),
        ));
        statements.push(Statement::new(
            nn(PREFS),
            nn(&format!("{UI}backgroundColor")),
            Literal::new_simple_literal("red"),
            nn(DOC),
        ));
        let f = fixture(statements);

        let data = json!({ "id": CHAT, "sharedPreferences": null });
        let result = f.shape.update(Write::from_json(DOC, data).unwrap()).await;
        assert!(result.is_ok(), "{:?}", result.errors);
        assert!(result.data.unwrap().get("sharedPreferences").is_none());

        let prefs: NamedOrBlankNode = nn(PREFS).into();
        let prefs_term: Term = nn(PREFS).into();
        let remote = f.transport.document(&nn(DOC)).unwrap().unwrap();
        assert!(remote.iter().all(|st| st.subject != prefs && st.object != prefs_term));
        assert!(f.store.match_pattern(Some(&prefs), None, None, None).unwrap().is_empty());
        assert!(f.store.match_pattern(None, None, Some(&prefs_term), None).unwrap().is_empty());
        assert_eq!(remote.len(), 2);
    }

    #[tokio::test]
    async fn clearing_a_typed_object_keeps_linked_entities() {
        let bob = "https://pod.example/chat#bob";
        let mut statements = chat_statements(DOC, CHAT, "Chat");
        statements.extend([
            Statement::new(nn(CHAT), nn(&format!("{UI}sharedPreferences")), nn(PREFS), nn(DOC)),
            Statement::new(nn(PREFS), rdf::TYPE.into_owned(), nn(&format!("{UI}Preferences")), nn(DOC)),
            Statement::new(nn(PREFS), nn(&format!("{DC}author")), nn(bob), nn(DOC)),
            Statement::new(nn(bob), nn(&format!("{DC}title")), Literal::new_simple_literal("Bob"), nn(DOC)),
            Statement::new(
                nn("https://pod.example/chat#otherPrefs"),
                rdf::TYPE.into_owned(),
                nn(&format!("{UI}Preferences")),
                nn(DOC),
            ),
        ]);
        let f = fixture(statements);

        let data = json!({ "id": CHAT, "sharedPreferences": null });
        let result = f.shape.update(Write::from_json(DOC, data).unwrap()).await;
        assert!(result.is_ok(), "{:?}", result.errors);

        let remote = f.transport.document(&nn(DOC)).unwrap().unwrap();
        let prefs: NamedOrBlankNode = nn(PREFS).into();
        assert!(remote.iter().all(|st| st.subject != prefs));
        assert!(remote.contains(&Statement::new(
            nn(bob),
            nn(&format!("{DC}title")),
            Literal::new_simple_literal("Bob"),
            nn(DOC),
        )));
        assert!(remote.contains(&Statement::new(
            nn("https://pod.example/chat#otherPrefs"),
            rdf::TYPE.into_owned(),
            nn(&format!("{UI}Preferences")),
            nn(DOC),
        )));
        assert_eq!(remote.len(), 4);
    }

    #[tokio::test]
    async fn update_of_id_less_list_leaves_no_orphans() {
        let f = fixture(chat_statements(DOC, CHAT, "Chat"));
        let first = json!({
            "id": CHAT,
            "participation": [{ "participant": "https://alice.example/profile/card#me" }],
        });
        assert!(f.shape.update(Write::from_json(DOC, first).unwrap()).await.is_ok());
        let second = json!({
            "id": CHAT,
            "participation": [{ "participant": "https://bob.example/profile/card#me" }],
        });
        let result = f.shape.update(Write::from_json(DOC, second).unwrap()).await;
        assert!(result.is_ok(), "{:?}", result.errors);

        let remote = f.transport.document(&nn(DOC)).unwrap().unwrap();
        let alice: Term = nn("https://alice.example/profile/card#me").into();
        assert!(remote.iter().all(|st| st.object != alice));
        assert_eq!(remote.len(), 4);
    }

    #[tokio::test]
    async fn update_exceeding_cardinality_is_rejected() {
        let f = fixture(chat_statements(DOC, CHAT, "Old"));
        let data = json!({ "id": CHAT, "title": ["One", "Two"] });
        let result = f.shape.update(Write::from_json(DOC, data).unwrap()).await;
        assert!(result.data.is_none());
        assert!(result.error_lines().iter().any(|line| line.contains("exceeds cardinality")));
        assert_eq!(f.transport.write_count(), 0);
        assert_eq!(
            f.transport.document(&nn(DOC)).unwrap(),
            Some(chat_statements(DOC, CHAT, "Old"))
        );
    }

    #[tokio::test]
    async fn update_of_unknown_node_fails() {
        let f = fixture(chat_statements(DOC, CHAT, "Chat"));
        let data = json!({ "id": "https://pod.example/chat#ghost", "title": "x" });
        let result = f.shape.update(Write::from_json(DOC, data).unwrap()).await;
        assert_eq!(
            result.error_lines(),
            [format!("Node with id: https://pod.example/chat#ghost does not exist in doc:{DOC}")]
        );
    }

    #[tokio::test]
    async fn update_without_changes_does_not_write() {
        let f = fixture(chat_statements(DOC, CHAT, "Same"));
        let data = json!({ "id": CHAT, "title": "Same" });
        let result = f.shape.update(Write::from_json(DOC, data).unwrap()).await;
        assert!(result.is_ok());
        assert_eq!(f.transport.write_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn delete_removes_exactly_the_subject_statements() {
        let mut statements = chat_statements(DOC, CHAT, "Chat");
        statements.extend(chat_statements(DOC, "https://pod.example/chat#other", "Other"));
        let f = fixture(statements);
        let result = f.shape.delete(Delete::new(DOC, CHAT)).await;
        assert!(result.is_ok());
        assert_eq!(
            f.transport.writes().unwrap(),
            vec![WriteRecord::Update {
                deletes: chat_statements(DOC, CHAT, "Chat"),
                inserts: Vec::new(),
            }]
        );
        assert_eq!(
            f.transport.document(&nn(DOC)).unwrap(),
            Some(chat_statements(DOC, "https://pod.example/chat#other", "Other"))
        );
    }

    #[tokio::test]
    async fn delete_of_unknown_node_is_a_no_op() {
        let f = fixture(chat_statements(DOC, CHAT, "Chat"));
        let result = f.shape.delete(Delete::new(DOC, "https://pod.example/chat#ghost")).await;
        assert!(result.is_ok());
        assert!(result.data.is_none());
        assert_eq!(f.transport.write_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Change sets
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn data_to_statements_diffs_against_loaded_state() {
        let f = fixture(chat_statements(DOC, CHAT, "Old"));
        f.shape.find_one(FindOne::new(DOC).with_id(CHAT)).await;
        let data = DataTree::from_json(json!({ "id": CHAT, "title": "New" })).unwrap();
        let changes = f.shape.data_to_statements(&data, DOC).unwrap();
        assert_eq!(changes.deletes, vec![chat_statements(DOC, CHAT, "Old")[1].clone()]);
        assert_eq!(changes.inserts, vec![chat_statements(DOC, CHAT, "New")[1].clone()]);
    }
}

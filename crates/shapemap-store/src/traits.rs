use shapemap_types::{NamedNode, NamedOrBlankNode, Statement, Term};

use crate::error::{StoreError, StoreResult};

/// Document-partitioned triple store.
///
/// All implementations must satisfy these invariants:
/// - Statements are a set: structurally equal statements are stored once.
/// - `match_pattern` treats `None` as a wildcard for that position.
/// - Operations on one document never affect statements of another.
pub trait TripleStore: Send + Sync {
    /// All statements matching the pattern, in insertion order.
    fn match_pattern(
        &self,
        subject: Option<&NamedOrBlankNode>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        graph: Option<&NamedNode>,
    ) -> StoreResult<Vec<Statement>>;

    /// Check whether a statement is present.
    fn contains(&self, statement: &Statement) -> StoreResult<bool>;

    /// Insert a statement. Returns `true` if it was not already present.
    fn insert(&self, statement: &Statement) -> StoreResult<bool>;

    /// Remove a statement. Returns `true` if it was present.
    fn remove(&self, statement: &Statement) -> StoreResult<bool>;

    /// Remove every statement of a document and return how many were removed.
    fn remove_document(&self, document: &NamedNode) -> StoreResult<usize>;

    /// Every document that currently owns at least one statement.
    fn documents(&self) -> StoreResult<Vec<NamedNode>>;

    /// Total number of statements.
    fn len(&self) -> StoreResult<usize>;

    /// Returns `true` if the store holds no statements.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// The first object bound to `(subject, predicate)`, optionally within one document.
    fn any_object(
        &self,
        subject: &NamedOrBlankNode,
        predicate: &NamedNode,
        graph: Option<&NamedNode>,
    ) -> StoreResult<Option<Term>> {
        Ok(self
            .match_pattern(Some(subject), Some(predicate), None, graph)?
            .into_iter()
            .next()
            .map(|st| st.object))
    }

    /// Every object bound to `(subject, predicate)`, optionally within one document.
    fn objects(
        &self,
        subject: &NamedOrBlankNode,
        predicate: &NamedNode,
        graph: Option<&NamedNode>,
    ) -> StoreResult<Vec<Term>> {
        Ok(self
            .match_pattern(Some(subject), Some(predicate), None, graph)?
            .into_iter()
            .map(|st| st.object)
            .collect())
    }

    /// All statements owned by a document.
    fn document_statements(&self, document: &NamedNode) -> StoreResult<Vec<Statement>> {
        self.match_pattern(None, None, None, Some(document))
    }

    /// Returns `true` if `subject` appears as a subject inside `document`.
    fn holds_subject(&self, subject: &NamedOrBlankNode, document: &NamedNode) -> StoreResult<bool> {
        Ok(!self
            .match_pattern(Some(subject), None, None, Some(document))?
            .is_empty())
    }

    /// Insert multiple statements. Returns how many were new.
    fn insert_all(&self, statements: &[Statement]) -> StoreResult<usize> {
        let mut added = 0;
        for st in statements {
            if self.insert(st)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Remove multiple statements. Returns how many were present.
    fn remove_all(&self, statements: &[Statement]) -> StoreResult<usize> {
        let mut removed = 0;
        for st in statements {
            if self.remove(st)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Replace the full contents of a document.
    ///
    /// Every statement must be tagged with `document`; the document is left
    /// untouched if any is not.
    fn replace_document(&self, document: &NamedNode, statements: &[Statement]) -> StoreResult<()> {
        if let Some(foreign) = statements.iter().find(|st| &st.graph != document) {
            return Err(StoreError::ForeignStatement {
                statement: Box::new(foreign.clone()),
                document: document.as_str().to_string(),
            });
        }
        self.remove_document(document)?;
        self.insert_all(statements)?;
        Ok(())
    }
}

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use shapemap_types::{DataTree, NamedNode, Statement};

use crate::error::{ShapeError, ShapeResult};

/// The document argument of an operation, echoed back in its result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DocRef {
    One(String),
    /// An ordered batch; reads are scoped to the union of the documents.
    Many(Vec<String>),
}

impl DocRef {
    /// The document IRIs, in order.
    pub fn uris(&self) -> Vec<&str> {
        match self {
            Self::One(doc) => vec![doc.as_str()],
            Self::Many(docs) => docs.iter().map(String::as_str).collect(),
        }
    }

    pub(crate) fn documents(&self) -> ShapeResult<Vec<NamedNode>> {
        self.uris()
            .into_iter()
            .map(|doc| Statement::document(doc).map_err(ShapeError::from))
            .collect()
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uris().join(", "))
    }
}

impl From<&str> for DocRef {
    fn from(doc: &str) -> Self {
        Self::One(doc.to_string())
    }
}

impl From<String> for DocRef {
    fn from(doc: String) -> Self {
        Self::One(doc)
    }
}

impl From<Vec<String>> for DocRef {
    fn from(docs: Vec<String>) -> Self {
        Self::Many(docs)
    }
}

impl From<Vec<&str>> for DocRef {
    fn from(docs: Vec<&str>) -> Self {
        Self::Many(docs.into_iter().map(str::to_string).collect())
    }
}

/// Uniform result of every shape operation.
///
/// Nothing is thrown: conflicts, unresolved fields, transport failures and
/// nonconformance all land in `errors`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryResult<T> {
    pub doc: DocRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> QueryResult<T> {
    pub fn new(doc: DocRef, data: Option<T>, errors: Option<Vec<String>>) -> Self {
        Self { doc, data, errors }
    }

    pub fn ok(doc: DocRef, data: Option<T>) -> Self {
        Self::new(doc, data, None)
    }

    pub fn failed(doc: DocRef, error: impl fmt::Display) -> Self {
        Self::new(doc, None, Some(vec![error.to_string()]))
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_none()
    }

    /// Error lines, empty when the operation succeeded.
    pub fn error_lines(&self) -> &[String] {
        self.errors.as_deref().unwrap_or_default()
    }
}

/// Arguments of [`Shape::find_one`](crate::Shape::find_one).
#[derive(Clone, Debug)]
pub struct FindOne {
    pub doc: DocRef,
    /// The node to read; without it, the first candidate of the shape's
    /// types is returned.
    pub id: Option<String>,
}

impl FindOne {
    pub fn new(doc: impl Into<DocRef>) -> Self {
        Self {
            doc: doc.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Arguments of [`Shape::find_all`](crate::Shape::find_all).
#[derive(Clone, Debug)]
pub struct FindAll {
    pub doc: DocRef,
    pub ids: Option<Vec<String>>,
    /// Equality filters on projected fields, keyed by any field alias.
    pub filters: BTreeMap<String, Value>,
}

impl FindAll {
    pub fn new(doc: impl Into<DocRef>) -> Self {
        Self {
            doc: doc.into(),
            ids: None,
            filters: BTreeMap::new(),
        }
    }

    pub fn with_ids<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

/// Arguments of [`Shape::create`](crate::Shape::create) and
/// [`Shape::update`](crate::Shape::update).
#[derive(Clone, Debug)]
pub struct Write {
    pub doc: String,
    /// Normalized data; `id` names the entity.
    pub data: DataTree,
}

impl Write {
    pub fn new(doc: impl Into<String>, data: DataTree) -> Self {
        Self { doc: doc.into(), data }
    }

    /// Build from a JSON object, such as one written with `json!`.
    pub fn from_json(doc: impl Into<String>, data: Value) -> ShapeResult<Self> {
        Ok(Self::new(doc, DataTree::from_json(data)?))
    }
}

/// Arguments of [`Shape::delete`](crate::Shape::delete).
#[derive(Clone, Debug)]
pub struct Delete {
    pub doc: String,
    pub id: String,
}

impl Delete {
    pub fn new(doc: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            doc: doc.into(),
            id: id.into(),
        }
    }
}

//! Shaped value trees.
//!
//! The same tree type carries data in two forms: *normalized* (keys are the
//! short field names a developer writes) and *absolute* (every key except
//! `id` is a full predicate IRI). Conversion between them lives in
//! `shapemap-transform`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use oxrdf::{Literal, NamedNode, NamedOrBlankNode, Term};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::{TypeError, TypeResult};

/// The reserved key holding an entity's node identity.
pub const ID_KEY: &str = "id";

/// The identity of a tree: either caller-supplied text (not yet checked to
/// be an IRI) or a node that has already been allocated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeId {
    Text(String),
    Node(NamedOrBlankNode),
}

impl NodeId {
    /// The textual form: the IRI of a named node, the label of a blank node,
    /// or the raw text.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Node(NamedOrBlankNode::NamedNode(n)) => n.as_str(),
            Self::Node(NamedOrBlankNode::BlankNode(b)) => b.as_str(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NamedNode> for NodeId {
    fn from(value: NamedNode) -> Self {
        Self::Node(value.into())
    }
}

impl From<NamedOrBlankNode> for NodeId {
    fn from(value: NamedOrBlankNode) -> Self {
        Self::Node(value)
    }
}

/// A single field value inside a [`DataTree`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// An explicitly cleared value.
    Null,
    Text(String),
    Number(Number),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    /// A value the caller marked as an IRI reference.
    Url(NamedNode),
    /// A pre-built RDF term, passed through untouched.
    Term(Term),
    List(Vec<FieldValue>),
    Object(DataTree),
}

impl FieldValue {
    /// Returns `true` if this value carries no data.
    ///
    /// Null values, empty sequences, sequences of empty values, and nested
    /// objects whose every field is empty are all empty. An `id` alone does
    /// not make an object non-empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::List(items) => items.iter().all(FieldValue::is_empty),
            Self::Object(tree) => tree.is_empty_branch(),
            _ => false,
        }
    }

    /// The nested tree, if this is an object.
    pub fn as_object(&self) -> Option<&DataTree> {
        match self {
            Self::Object(tree) => Some(tree),
            _ => None,
        }
    }

    /// The elements, if this is a sequence.
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// A textual view of scalar values: text, IRIs, and term lexical forms.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Url(node) => Some(node.as_str()),
            Self::Term(Term::NamedNode(node)) => Some(node.as_str()),
            Self::Term(Term::Literal(literal)) => Some(literal.value()),
            _ => None,
        }
    }

    /// Convert into a JSON value.
    ///
    /// Dates render as ISO-8601 with millisecond precision; IRIs and terms
    /// render as their IRI or lexical form.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Text(text) => Value::String(text.clone()),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Url(node) => Value::String(node.as_str().to_string()),
            Self::Term(term) => Value::String(term_text(term)),
            Self::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            Self::Object(tree) => tree.to_json(),
        }
    }
}

fn term_text(term: &Term) -> String {
    match term {
        Term::NamedNode(n) => n.as_str().to_string(),
        Term::Literal(l) => l.value().to_string(),
        other => other.to_string(),
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => Self::Object(DataTree::from_map(map)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<NamedNode> for FieldValue {
    fn from(value: NamedNode) -> Self {
        Self::Url(value)
    }
}

impl From<Literal> for FieldValue {
    fn from(value: Literal) -> Self {
        Self::Term(value.into())
    }
}

impl From<Term> for FieldValue {
    fn from(value: Term) -> Self {
        Self::Term(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        Self::List(value)
    }
}

impl From<DataTree> for FieldValue {
    fn from(value: DataTree) -> Self {
        Self::Object(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A nested mapping from keys to field values plus the reserved `id`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTree {
    pub id: Option<NodeId>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl DataTree {
    /// Create an empty tree with no identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with the given identity.
    pub fn with_id(id: impl Into<NodeId>) -> Self {
        Self {
            id: Some(id.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Look up a field by its exact key.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// The identity as text, if present.
    pub fn id_str(&self) -> Option<&str> {
        self.id.as_ref().map(NodeId::as_str)
    }

    /// Number of fields, not counting `id`.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if every field is empty (see [`FieldValue::is_empty`]).
    pub fn is_empty_branch(&self) -> bool {
        self.fields.values().all(FieldValue::is_empty)
    }

    /// Build a tree from a JSON value, which must be an object.
    pub fn from_json(value: Value) -> TypeResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            Value::Null => Err(TypeError::NotAnObject("null")),
            Value::Bool(_) => Err(TypeError::NotAnObject("a boolean")),
            Value::Number(_) => Err(TypeError::NotAnObject("a number")),
            Value::String(_) => Err(TypeError::NotAnObject("a string")),
            Value::Array(_) => Err(TypeError::NotAnObject("an array")),
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        let mut tree = Self::new();
        for (key, value) in map {
            if key == ID_KEY {
                if let Value::String(id) = value {
                    tree.id = Some(NodeId::Text(id));
                }
                continue;
            }
            tree.fields.insert(key, FieldValue::from(value));
        }
        tree
    }

    /// Convert into a JSON object, with `id` first when present.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(id) = &self.id {
            map.insert(ID_KEY.into(), Value::String(id.as_str().to_string()));
        }
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.to_json());
        }
        Value::Object(map)
    }
}

impl TryFrom<Value> for DataTree {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}

impl Serialize for DataTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

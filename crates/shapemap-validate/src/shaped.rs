use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;
use shapemap_context::AliasTable;
use shapemap_types::{DataTree, FieldValue, ID_KEY};

/// Projected data of a conformant node, with alias-aware field access.
///
/// Fields can be read by short name (`name`), prefixed key (`foaf:name`),
/// or absolute predicate IRI. Nested objects returned by [`nested`] and
/// [`nested_items`] share the same alias table.
///
/// [`nested`]: ShapedObject::nested
/// [`nested_items`]: ShapedObject::nested_items
#[derive(Clone, Debug)]
pub struct ShapedObject {
    shape: Option<String>,
    tree: DataTree,
    aliases: Arc<AliasTable>,
}

impl ShapedObject {
    pub fn new(shape: Option<String>, tree: DataTree, aliases: Arc<AliasTable>) -> Self {
        Self { shape, tree, aliases }
    }

    /// The shape this object was validated against; `None` for nested views.
    pub fn shape(&self) -> Option<&str> {
        self.shape.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.tree.id_str()
    }

    pub fn tree(&self) -> &DataTree {
        &self.tree
    }

    pub fn into_tree(self) -> DataTree {
        self.tree
    }

    /// Look up a field by any of its aliases.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.tree.get(key).or_else(|| {
            self.aliases
                .field_for(key)
                .and_then(|field| self.tree.get(field))
        })
    }

    /// Text view of a scalar field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        if key == ID_KEY {
            return self.id();
        }
        self.get(key).and_then(FieldValue::as_str)
    }

    /// An alias-aware view of a nested object.
    pub fn nested(&self, key: &str) -> Option<ShapedObject> {
        self.get(key)
            .and_then(FieldValue::as_object)
            .map(|tree| self.child(tree))
    }

    /// The values of a field as a sequence: a single value yields one item,
    /// an absent field none.
    pub fn items(&self, key: &str) -> Vec<&FieldValue> {
        match self.get(key) {
            Some(FieldValue::List(items)) => items.iter().collect(),
            Some(value) => vec![value],
            None => Vec::new(),
        }
    }

    /// The nested objects of a field, as alias-aware views.
    pub fn nested_items(&self, key: &str) -> Vec<ShapedObject> {
        self.items(key)
            .into_iter()
            .filter_map(FieldValue::as_object)
            .map(|tree| self.child(tree))
            .collect()
    }

    /// Returns `true` if the field holds `expected`, or holds a sequence
    /// containing it. `id` compares against the identity.
    pub fn matches(&self, key: &str, expected: &Value) -> bool {
        if key == ID_KEY {
            return self.id().map(|id| Value::String(id.to_string())).as_ref() == Some(expected);
        }
        match self.get(key) {
            Some(value) => {
                let actual = value.to_json();
                actual == *expected || matches!(&actual, Value::Array(items) if items.contains(expected))
            }
            None => expected.is_null(),
        }
    }

    pub fn to_json(&self) -> Value {
        self.tree.to_json()
    }

    /// Deserialize into a caller-defined type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }

    fn child(&self, tree: &DataTree) -> ShapedObject {
        ShapedObject::new(None, tree.clone(), Arc::clone(&self.aliases))
    }
}

impl PartialEq for ShapedObject {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.tree == other.tree
    }
}

impl Serialize for ShapedObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tree.serialize(serializer)
    }
}

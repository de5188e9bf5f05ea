use std::collections::HashMap;

use crate::context::ContextSet;

/// Bidirectional name table for alias-aware field access.
///
/// Built once per shape descriptor. A consumer may address a field by its
/// short name (`name`), its prefixed key (`foaf:name`), or its absolute
/// predicate IRI; all three resolve to the same field. When several
/// contexts define a field or key, the first context wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AliasTable {
    field_to_key: HashMap<String, String>,
    key_to_field: HashMap<String, String>,
    iri_to_field: HashMap<String, String>,
}

impl AliasTable {
    pub fn from_contexts(contexts: &ContextSet) -> Self {
        let mut table = Self::default();
        for context in contexts.contexts() {
            for (field, key) in context {
                table.field_to_key.entry(field.clone()).or_insert_with(|| key.clone());
                table.key_to_field.entry(key.clone()).or_insert_with(|| field.clone());
                if let Some(iri) = contexts.absolute(key) {
                    table.iri_to_field.entry(iri).or_insert_with(|| field.clone());
                }
            }
        }
        table
    }

    /// The canonical field name for any alias, or `None` if unknown.
    pub fn field_for<'a>(&'a self, alias: &'a str) -> Option<&'a str> {
        if self.field_to_key.contains_key(alias) {
            return Some(alias);
        }
        self.key_to_field
            .get(alias)
            .or_else(|| self.iri_to_field.get(alias))
            .map(String::as_str)
    }

    /// The prefixed key of a field.
    pub fn key_for(&self, field: &str) -> Option<&str> {
        self.field_to_key.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.field_to_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_to_key.is_empty()
    }
}

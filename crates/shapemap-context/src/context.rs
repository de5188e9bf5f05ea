use std::collections::BTreeMap;

use oxiri::Iri;
use serde::{Deserialize, Serialize};
use shapemap_types::NamedNode;

use crate::error::{ContextError, ContextResult};
use crate::names::{local_name, raw_local_name};

/// A mapping from short field names to prefixed predicate keys.
pub type Context = BTreeMap<String, String>;

/// Ordered contexts plus the prefix table that expands their keys.
///
/// Contexts are searched in order: the first one that defines a field wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSet {
    contexts: Vec<Context>,
    prefixes: BTreeMap<String, String>,
}

impl ContextSet {
    pub fn new(contexts: Vec<Context>, prefixes: BTreeMap<String, String>) -> Self {
        Self { contexts, prefixes }
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }

    /// Append a context searched after every existing one.
    pub fn push_context(&mut self, context: Context) {
        self.contexts.push(context);
    }

    /// Bind a prefix unless it is already bound.
    pub fn bind_default_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.entry(prefix.into()).or_insert_with(|| namespace.into());
    }

    /// The prefixed key a field maps to, from the first context defining it.
    pub fn key_of(&self, field: &str) -> Option<&str> {
        self.contexts
            .iter()
            .find_map(|context| context.get(field))
            .map(String::as_str)
    }

    /// Resolve a field name to its absolute predicate.
    ///
    /// Fails if no context defines the field, or if its key cannot be
    /// expanded with the prefix table.
    pub fn resolve(&self, field: &str) -> ContextResult<NamedNode> {
        let key = self.key_of(field).ok_or_else(|| ContextError::UnresolvedField {
            field: field.to_string(),
            contexts: serde_json::to_string(&self.contexts).unwrap_or_default(),
        })?;
        let iri = self.expand_key(field, key)?;
        NamedNode::new(iri.as_str()).map_err(|e| ContextError::InvalidPredicate {
            field: field.to_string(),
            iri,
            reason: e.to_string(),
        })
    }

    fn expand_key(&self, field: &str, key: &str) -> ContextResult<String> {
        self.absolute(key).ok_or_else(|| ContextError::UnknownPrefix {
            field: field.to_string(),
            prefix: key.split_once(':').map_or(key, |(prefix, _)| prefix).to_string(),
        })
    }

    /// Expand a prefixed key (`foaf:name`) into an absolute IRI, if its
    /// prefix is known.
    pub fn expand(&self, key: &str) -> Option<String> {
        let (prefix, local) = key.split_once(':')?;
        self.prefixes
            .get(prefix)
            .map(|namespace| format!("{namespace}{local}"))
    }

    /// The absolute IRI a context value stands for: its expansion, or the
    /// value itself when it is already an absolute IRI.
    pub fn absolute(&self, key: &str) -> Option<String> {
        self.expand(key)
            .or_else(|| is_absolute_iri(key).then(|| key.to_string()))
    }

    /// Find the field name a predicate maps to.
    ///
    /// Returns `None` when no context defines the predicate; unknown
    /// predicates are not an error on the read path.
    pub fn reverse_resolve(&self, predicate: &str) -> Option<String> {
        let camel = local_name(predicate);
        let raw = raw_local_name(predicate);
        for (prefix, _) in self.namespaces_within(predicate) {
            for local in [camel.as_str(), raw] {
                let candidate = format!("{prefix}:{local}");
                if let Some(field) = self.field_with_key(&candidate) {
                    return Some(field.to_string());
                }
            }
        }
        // Fall back to an exact match for keys whose local part does not
        // follow the usual naming, and for absolute IRI values.
        self.contexts.iter().find_map(|context| {
            context
                .iter()
                .find(|(_, key)| self.absolute(key).as_deref() == Some(predicate))
                .map(|(field, _)| field.clone())
        })
    }

    /// The `prefix:local` form of a predicate, using the longest namespace
    /// the predicate starts with.
    pub fn prefixed_key(&self, predicate: &str) -> Option<String> {
        self.prefixes
            .iter()
            .filter(|(_, namespace)| !namespace.is_empty() && predicate.starts_with(namespace.as_str()))
            .max_by_key(|(_, namespace)| namespace.len())
            .map(|(prefix, namespace)| format!("{prefix}:{}", &predicate[namespace.len()..]))
    }

    /// The key a predicate is shown under in projected data: its field
    /// name, else its prefixed key, else the raw IRI.
    pub fn display_key(&self, predicate: &str) -> String {
        self.reverse_resolve(predicate)
            .or_else(|| self.prefixed_key(predicate))
            .unwrap_or_else(|| predicate.to_string())
    }

    fn field_with_key(&self, key: &str) -> Option<&str> {
        self.contexts.iter().find_map(|context| {
            context
                .iter()
                .find(|(_, value)| value.as_str() == key)
                .map(|(field, _)| field.as_str())
        })
    }

    /// Prefixes whose namespace occurs in the predicate, longest first.
    fn namespaces_within<'a>(&'a self, predicate: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let mut found: Vec<(&str, &str)> = self
            .prefixes
            .iter()
            .filter(|(_, namespace)| !namespace.is_empty() && predicate.contains(namespace.as_str()))
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
            .collect();
        found.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        found.into_iter()
    }
}

/// Whether a context value is a full IRI rather than a prefixed key.
///
/// `dcx:title` parses as an IRI with scheme `dcx`, so only hierarchical
/// IRIs and `urn:` names count; anything else is an unbound prefix.
fn is_absolute_iri(value: &str) -> bool {
    (value.contains("://") || value.starts_with("urn:")) && Iri::parse(value).is_ok()
}

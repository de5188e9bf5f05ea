use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use shapemap_context::{AliasTable, Context, ContextSet};
use shapemap_types::NamedNode;
use shapemap_validate::{SchemaValidator, ShapeSchema, ShapeValidator};

use crate::config::ShapeConfig;
use crate::error::{ShapeError, ShapeResult};

const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Everything a [`Shape`](crate::Shape) needs to know about its schema.
///
/// Immutable once built. The context set and alias table are computed once
/// here and shared by every operation.
#[derive(Clone)]
pub struct ShapeDescriptor {
    id: String,
    types: Vec<NamedNode>,
    contexts: ContextSet,
    aliases: Arc<AliasTable>,
    validator: Arc<dyn ShapeValidator>,
}

impl ShapeDescriptor {
    pub fn builder(id: impl Into<String>) -> ShapeDescriptorBuilder {
        ShapeDescriptorBuilder::new(id)
    }

    /// The shape IRI validated against.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Classes whose instances are candidates when no ids are given.
    pub fn types(&self) -> &[NamedNode] {
        &self.types
    }

    pub fn contexts(&self) -> &ContextSet {
        &self.contexts
    }

    pub fn aliases(&self) -> &Arc<AliasTable> {
        &self.aliases
    }

    pub fn validator(&self) -> &dyn ShapeValidator {
        self.validator.as_ref()
    }
}

impl fmt::Debug for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeDescriptor")
            .field("id", &self.id)
            .field("types", &self.types)
            .field("contexts", &self.contexts)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ShapeDescriptor`].
pub struct ShapeDescriptorBuilder {
    id: String,
    context: Context,
    child_contexts: Vec<Context>,
    prefixes: BTreeMap<String, String>,
    types: Vec<String>,
    validator: Option<Arc<dyn ShapeValidator>>,
    rdf_prefix: String,
}

impl ShapeDescriptorBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context: Context::new(),
            child_contexts: Vec::new(),
            prefixes: BTreeMap::new(),
            types: Vec::new(),
            validator: None,
            rdf_prefix: ShapeConfig::default().rdf_prefix,
        }
    }

    /// The primary context, consulted first.
    pub fn context<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.context = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// A context for nested objects, consulted after the ones before it.
    pub fn child_context<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.child_contexts
            .push(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Bind prefixes; later bindings of the same prefix win.
    pub fn prefixes<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.prefixes
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Class IRIs (absolute or prefixed) of the shape's instances.
    pub fn types<T: Into<String>>(mut self, types: impl IntoIterator<Item = T>) -> Self {
        self.types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn validator(mut self, validator: Arc<dyn ShapeValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Validate with a [`SchemaValidator`] over `schema` and adopt the
    /// schema's prefixes.
    pub fn schema(mut self, schema: ShapeSchema) -> Self {
        self.prefixes
            .extend(schema.prefixes().iter().map(|(k, v)| (k.clone(), v.clone())));
        self.validator = Some(Arc::new(SchemaValidator::new(schema)));
        self
    }

    /// Take the RDF prefix name from `config`.
    pub fn with_config(mut self, config: &ShapeConfig) -> Self {
        self.rdf_prefix = config.rdf_prefix.clone();
        self
    }

    pub fn build(self) -> ShapeResult<ShapeDescriptor> {
        let validator = self
            .validator
            .ok_or_else(|| ShapeError::MissingValidator(self.id.clone()))?;

        let mut contexts = ContextSet::new(vec![self.context], self.prefixes);
        for child in self.child_contexts {
            contexts.push_context(child);
        }
        contexts.bind_default_prefix(self.rdf_prefix, RDF_NAMESPACE);

        let types = self
            .types
            .iter()
            .map(|t| {
                let iri = contexts.expand(t).unwrap_or_else(|| t.clone());
                NamedNode::new(iri.as_str()).map_err(|e| ShapeError::InvalidType {
                    iri: t.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<ShapeResult<Vec<_>>>()?;

        let aliases = Arc::new(AliasTable::from_contexts(&contexts));
        Ok(ShapeDescriptor {
            id: self.id,
            types,
            contexts,
            aliases,
            validator,
        })
    }
}

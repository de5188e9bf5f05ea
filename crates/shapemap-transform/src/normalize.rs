use shapemap_context::ContextSet;
use shapemap_types::{DataTree, FieldValue};

use crate::error::TransformResult;

/// Replace every field name in `tree` (recursively) with its absolute
/// predicate IRI.
///
/// The `id` passes through untouched. Dates, IRIs, and pre-built terms are
/// leaves; nested objects and sequence elements are recursed into. Any
/// unresolvable field fails the whole call.
pub fn normalized_to_absolute(tree: &DataTree, contexts: &ContextSet) -> TransformResult<DataTree> {
    let mut absolute = DataTree {
        id: tree.id.clone(),
        fields: Default::default(),
    };
    for (field, value) in &tree.fields {
        let predicate = contexts.resolve(field)?;
        absolute
            .fields
            .insert(predicate.as_str().to_string(), value_to_absolute(value, contexts)?);
    }
    Ok(absolute)
}

fn value_to_absolute(value: &FieldValue, contexts: &ContextSet) -> TransformResult<FieldValue> {
    Ok(match value {
        FieldValue::Object(nested) => FieldValue::Object(normalized_to_absolute(nested, contexts)?),
        FieldValue::List(items) => FieldValue::List(
            items
                .iter()
                .map(|item| value_to_absolute(item, contexts))
                .collect::<TransformResult<_>>()?,
        ),
        leaf => leaf.clone(),
    })
}

/// Replace every predicate IRI in `tree` (recursively) with its field name.
///
/// Predicates no context defines are kept under their prefixed key, or
/// under the raw IRI when no prefix matches; they are never dropped.
pub fn absolute_to_normalized(tree: &DataTree, contexts: &ContextSet) -> DataTree {
    let mut normalized = DataTree {
        id: tree.id.clone(),
        fields: Default::default(),
    };
    for (predicate, value) in &tree.fields {
        normalized
            .fields
            .insert(contexts.display_key(predicate), value_to_normalized(value, contexts));
    }
    normalized
}

fn value_to_normalized(value: &FieldValue, contexts: &ContextSet) -> FieldValue {
    match value {
        FieldValue::Object(nested) => FieldValue::Object(absolute_to_normalized(nested, contexts)),
        FieldValue::List(items) => FieldValue::List(
            items
                .iter()
                .map(|item| value_to_normalized(item, contexts))
                .collect(),
        ),
        leaf => leaf.clone(),
    }
}

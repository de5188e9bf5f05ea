//! Projection of validated match trees into shaped objects.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Number;
use shapemap_context::{AliasTable, ContextSet};
use shapemap_transform::absolute_to_normalized;
use shapemap_types::vocab::xsd;
use shapemap_types::{term_to_node, DataTree, FieldValue, NamedOrBlankNode, NodeId, Term};

use crate::outcome::{MatchTree, MatchValue};
use crate::shaped::ShapedObject;

/// Project a conformant node into a shaped object.
///
/// The match tree is flattened into an absolute tree, then its predicates
/// are mapped back to field names.
pub fn project(
    tree: &MatchTree,
    node: &NamedOrBlankNode,
    shape: &str,
    contexts: &ContextSet,
    aliases: Arc<AliasTable>,
) -> ShapedObject {
    let absolute = match_tree_to_absolute(tree, node);
    ShapedObject::new(Some(shape.to_string()), absolute_to_normalized(&absolute, contexts), aliases)
}

/// Flatten a match tree rooted at `node` into an absolute tree.
///
/// A predicate with one matched value becomes a scalar; several values
/// become a sequence.
pub fn match_tree_to_absolute(tree: &MatchTree, node: &NamedOrBlankNode) -> DataTree {
    let mut absolute = DataTree {
        id: Some(NodeId::Node(node.clone())),
        fields: Default::default(),
    };
    for (predicate, values) in tree.entries() {
        let value = match values {
            [single] => match_value_to_field(single),
            many => FieldValue::List(many.iter().map(match_value_to_field).collect()),
        };
        absolute.fields.insert(predicate.to_string(), value);
    }
    absolute
}

fn match_value_to_field(value: &MatchValue) -> FieldValue {
    match (&value.nested, term_to_node(&value.term)) {
        (Some(nested), Some(node)) => FieldValue::Object(match_tree_to_absolute(nested, &node)),
        _ => term_to_field(&value.term),
    }
}

/// The field value a stored term reads back as.
///
/// IRIs become URLs; `xsd:integer`, `xsd:decimal`, `xsd:boolean`, and
/// `xsd:dateTime` literals with valid lexical forms become numbers,
/// booleans, and dates; every other literal reads back as text.
pub fn term_to_field(term: &Term) -> FieldValue {
    match term {
        Term::NamedNode(node) => FieldValue::Url(node.clone()),
        Term::Literal(literal) => {
            let value = literal.value();
            let datatype = literal.datatype();
            let typed = if datatype == xsd::INTEGER {
                value.parse::<i64>().ok().map(|n| FieldValue::Number(n.into()))
            } else if datatype == xsd::DECIMAL {
                value
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(FieldValue::Number)
            } else if datatype == xsd::BOOLEAN {
                match value {
                    "true" | "1" => Some(FieldValue::Boolean(true)),
                    "false" | "0" => Some(FieldValue::Boolean(false)),
                    _ => None,
                }
            } else if datatype == xsd::DATE_TIME {
                DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|dt| FieldValue::DateTime(dt.with_timezone(&Utc)))
            } else {
                None
            };
            typed.unwrap_or_else(|| FieldValue::Text(value.to_string()))
        }
        other => FieldValue::Term(other.clone()),
    }
}

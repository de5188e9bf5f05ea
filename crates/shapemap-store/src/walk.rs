//! Sub-graph collection rooted at a node.

use std::collections::HashSet;

use shapemap_types::{dedup_statements, node_to_term, NamedNode, NamedOrBlankNode, NodeAllocator, Statement};

use crate::error::StoreResult;
use crate::traits::TripleStore;

/// Collect every statement describing `root` inside `graph`.
///
/// The result holds the statements with `root` as subject, every statement
/// pointing at `root`, and the sub-trees `root` owns. A child is owned, and
/// walked into, when it is a blank node or an identity `allocator` minted in
/// `graph`, and no node outside the current parent links to it. Caller-named
/// entities, classes and other documents' nodes are never entered, so only
/// the link to them is collected.
///
/// `boundary` is never entered: pass the owning entity so a back-link from
/// a child does not pull the parent in.
pub fn statements_of_node(
    store: &dyn TripleStore,
    root: &NamedOrBlankNode,
    graph: &NamedNode,
    boundary: Option<&NamedOrBlankNode>,
    allocator: &NodeAllocator,
) -> StoreResult<Vec<Statement>> {
    let namespace = format!("{}#", graph.as_str());
    let mut visited = HashSet::new();
    let mut stack = vec![root.clone()];
    let mut collected = store.match_pattern(None, None, Some(&node_to_term(root)), Some(graph))?;

    while let Some(node) = stack.pop() {
        if Some(&node) == boundary || !visited.insert(node.clone()) {
            continue;
        }
        for st in store.match_pattern(Some(&node), None, None, Some(graph))? {
            if let Some(child) = st.object_node() {
                if !visited.contains(&child) && is_owned(store, &child, &node, graph, &namespace, allocator)? {
                    stack.push(child);
                }
            }
            collected.push(st);
        }
    }

    Ok(dedup_statements(collected))
}

/// Whether `child` belongs to the sub-tree of `parent`.
fn is_owned(
    store: &dyn TripleStore,
    child: &NamedOrBlankNode,
    parent: &NamedOrBlankNode,
    graph: &NamedNode,
    namespace: &str,
    allocator: &NodeAllocator,
) -> StoreResult<bool> {
    if let NamedOrBlankNode::NamedNode(iri) = child {
        if !iri.as_str().starts_with(namespace) || !allocator.is_minted(iri) {
            return Ok(false);
        }
    }
    let referrers = store.match_pattern(None, None, Some(&node_to_term(child)), Some(graph))?;
    Ok(referrers.iter().all(|st| st.has_subject(parent)))
}

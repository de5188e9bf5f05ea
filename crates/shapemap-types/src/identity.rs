//! Node identity allocation.
//!
//! Entities without a caller-supplied identifier still receive a named node
//! inside the owning document (`<doc>#id<uuid>`), never an anonymous blank
//! node, so every synthesized entity stays independently fetchable.

use oxrdf::{NamedNode, NamedOrBlankNode};

use crate::value::NodeId;

/// Fragment prefix used for minted identities when none is configured.
pub const DEFAULT_FRAGMENT_PREFIX: &str = "id";

/// Allocates stable subject/object identities scoped to a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeAllocator {
    fragment_prefix: String,
}

impl NodeAllocator {
    /// Create an allocator that mints fragments starting with `fragment_prefix`.
    pub fn new(fragment_prefix: impl Into<String>) -> Self {
        Self {
            fragment_prefix: fragment_prefix.into(),
        }
    }

    /// The fragment prefix for minted identities.
    pub fn fragment_prefix(&self) -> &str {
        &self.fragment_prefix
    }

    /// Return the identity for an entity stored in `document`.
    ///
    /// - an already allocated node is returned unchanged
    /// - text that parses as an absolute IRI becomes a named node
    /// - anything else (missing, or not an IRI) gets a fresh identity
    pub fn allocate(&self, document: &NamedNode, existing: Option<&NodeId>) -> NamedOrBlankNode {
        match existing {
            Some(NodeId::Node(node)) => node.clone(),
            Some(NodeId::Text(text)) => match NamedNode::new(text.as_str()) {
                Ok(node) => node.into(),
                Err(_) => self.mint(document).into(),
            },
            None => self.mint(document).into(),
        }
    }

    /// Mint a new named node in `document` with a unique fragment.
    pub fn mint(&self, document: &NamedNode) -> NamedNode {
        let base = document
            .as_str()
            .split('#')
            .next()
            .unwrap_or(document.as_str());
        let suffix = uuid::Uuid::now_v7().simple();
        NamedNode::new_unchecked(format!("{base}#{}{suffix}", self.fragment_prefix))
    }

    /// Returns `true` if `node` has the form of an identity minted here:
    /// a fragment of the configured prefix followed by a simple uuid.
    pub fn is_minted(&self, node: &NamedNode) -> bool {
        node.as_str()
            .split_once('#')
            .and_then(|(_, fragment)| fragment.strip_prefix(self.fragment_prefix.as_str()))
            .is_some_and(|suffix| suffix.len() == 32 && suffix.bytes().all(|b| b.is_ascii_hexdigit()))
    }
}

impl Default for NodeAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_FRAGMENT_PREFIX)
    }
}

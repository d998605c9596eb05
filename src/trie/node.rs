//! Trie node types

use std::collections::BTreeMap;

/// A node in the path trie
///
/// A node is either:
/// - a bucket: one or more children and no value
/// - a leaf: no children and a value (possibly zero-length)
///
/// A node with neither only exists while a path is being built, or after
/// every child of a bucket has been deleted.
#[derive(Clone, Debug, Default)]
pub struct Node {
    children: BTreeMap<String, Node>,
    value: Option<Vec<u8>>,
}

impl Node {
    /// Create an empty node
    pub fn empty() -> Self {
        Node::default()
    }

    pub fn is_leaf(&self) -> bool {
        self.value.is_some() && self.children.is_empty()
    }

    pub fn is_bucket(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    /// Store a copy of `value`. Returns false if the node has children.
    pub fn set_value(&mut self, value: &[u8]) -> bool {
        if self.is_bucket() {
            return false;
        }
        self.value = Some(value.to_vec());
        true
    }

    pub fn child(&self, segment: &str) -> Option<&Node> {
        self.children.get(segment)
    }

    pub fn child_mut(&mut self, segment: &str) -> Option<&mut Node> {
        self.children.get_mut(segment)
    }

    pub fn children(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.children.iter()
    }

    /// Get or create the child for `segment`. Returns the child and whether it was created.
    pub(crate) fn child_or_insert(&mut self, segment: &str) -> (&mut Node, bool) {
        let created = !self.children.contains_key(segment);
        let child = self.children.entry(segment.to_string()).or_default();
        (child, created)
    }

    pub(crate) fn remove_child(&mut self, segment: &str) -> Option<Node> {
        self.children.remove(segment)
    }

    /// Number of leaves in this subtree
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        self.children.values().map(Node::leaf_count).sum()
    }
}

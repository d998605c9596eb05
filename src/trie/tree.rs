//! Path trie holding the store's buckets and leaves

use super::{KeyPath, Node};
use crate::{Error, Result};
use std::collections::BTreeSet;

/// A trie of `/`-delimited paths rooted at a namespace
///
/// The root is always a bucket and can never be removed. All methods take
/// already-normalized [`KeyPath`]s; locking is the caller's concern.
#[derive(Debug, Default)]
pub struct PathTrie {
    root: Node,
}

/// Result of walking a path while creating missing nodes
pub struct Insertion<'a> {
    /// The node at the end of the path
    pub node: &'a mut Node,
    /// Depth of the first node created by the walk, if any
    pub created_at: Option<usize>,
}

impl Insertion<'_> {
    /// Whether the full path existed before the walk
    pub fn existed(&self) -> bool {
        self.created_at.is_none()
    }
}

impl PathTrie {
    /// Create a trie holding only the root bucket
    pub fn new() -> Self {
        PathTrie { root: Node::empty() }
    }

    /// Resolve a path to its node
    pub fn get(&self, path: &KeyPath) -> Result<&Node> {
        self.traverse(path.segments())
            .ok_or_else(|| Error::KeyNotFound(path.joined()))
    }

    /// Walk `path`, creating every missing node along the way
    ///
    /// Fails with `BucketConflict` before touching the tree if the walk would
    /// have to pass through an existing leaf.
    pub fn insert_path(&mut self, path: &KeyPath) -> Result<Insertion<'_>> {
        let segments = path.segments();
        self.check_extendable(segments)?;

        let mut node = &mut self.root;
        let mut created_at = None;
        for (depth, segment) in segments.iter().enumerate() {
            let (child, created) = node.child_or_insert(segment);
            if created && created_at.is_none() {
                created_at = Some(depth);
            }
            node = child;
        }

        Ok(Insertion { node, created_at })
    }

    /// Remove the node at `path` together with its whole subtree
    pub fn remove(&mut self, path: &KeyPath) -> Result<Node> {
        let (parent, name) = path
            .split_last()
            .ok_or_else(|| Error::InvalidKey("the root cannot be removed".into()))?;

        self.traverse_mut(parent)
            .and_then(|parent| parent.remove_child(name))
            .ok_or_else(|| Error::KeyNotFound(path.joined()))
    }

    /// Full paths of every leaf below `prefix`
    pub fn leaves(&self, prefix: &KeyPath) -> Result<BTreeSet<String>> {
        let node = self.get(prefix)?;
        let mut current = prefix.segments().to_vec();
        let mut results = BTreeSet::new();
        collect_leaves(node, &mut current, &mut results);
        Ok(results)
    }

    /// Number of leaves in the trie
    pub fn len(&self) -> usize {
        self.root.leaf_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // === Internal helpers ===

    fn traverse(&self, segments: &[String]) -> Option<&Node> {
        segments
            .iter()
            .try_fold(&self.root, |node, segment| node.child(segment))
    }

    fn traverse_mut(&mut self, segments: &[String]) -> Option<&mut Node> {
        let mut node = &mut self.root;
        for segment in segments {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }

    fn check_extendable(&self, segments: &[String]) -> Result<()> {
        let mut node = &self.root;
        for (depth, segment) in segments.iter().enumerate() {
            if node.value().is_some() {
                return Err(Error::BucketConflict(format!(
                    "{} holds a value and cannot contain {}",
                    segments[..depth].join("/"),
                    segments.join("/")
                )));
            }
            match node.child(segment) {
                Some(child) => node = child,
                None => return Ok(()),
            }
        }
        Ok(())
    }
}

fn collect_leaves(node: &Node, current: &mut Vec<String>, results: &mut BTreeSet<String>) {
    for (segment, child) in node.children() {
        current.push(segment.clone());
        if child.is_bucket() {
            collect_leaves(child, current, results);
        } else if child.value().is_some() {
            results.insert(current.join("/"));
        }
        current.pop();
    }
}

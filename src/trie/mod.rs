//! Path trie for hierarchical keys
//!
//! Keys are `/`-delimited paths:
//! - Intermediate segments are buckets (like directories)
//! - Only the last segment of a key holds a value (like a file)
//! - A node never has both children and a value

mod node;
mod path;
mod tree;

pub use node::Node;
pub use path::{KeyPath, SEPARATOR};
pub use tree::{Insertion, PathTrie};

//! Key normalization

use crate::{Error, Result};
use std::fmt;

/// Path separator for keys
pub const SEPARATOR: char = '/';

/// A normalized key: the ordered, non-empty segments of a `/`-delimited path
///
/// Leading, trailing and repeated separators are dropped, so `"/a//b/"` and
/// `"a/b"` name the same key. `.` segments are dropped and `..` removes the
/// segment before it, stopping at the root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a key that must name a single node below the root
    pub fn parse(key: &str) -> Result<Self> {
        if key.trim().is_empty() {
            return Err(Error::InvalidKey("empty key is not allowed".into()));
        }

        let path = Self::split(key);
        if path.is_root() {
            return Err(Error::InvalidKey(format!(
                "key {:?} has no path segments",
                key
            )));
        }
        Ok(path)
    }

    /// Parse a prefix for enumeration, where an empty path denotes the root
    pub fn prefix(key: &str) -> Self {
        Self::split(key)
    }

    /// The root path
    pub fn root() -> Self {
        KeyPath {
            segments: Vec::new(),
        }
    }

    fn split(key: &str) -> Self {
        let mut segments: Vec<String> = Vec::new();
        for segment in key.split(SEPARATOR) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                _ => segments.push(segment.to_string()),
            }
        }
        KeyPath { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split off the last segment, returning the parent segments and the name
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.segments
            .split_last()
            .map(|(last, parent)| (parent, last.as_str()))
    }

    /// The first `len` segments of this path
    pub fn ancestor(&self, len: usize) -> Self {
        KeyPath {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Join segments with the separator, without a leading slash
    pub fn joined(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_separators() {
        let path = KeyPath::parse("/a//b/c/").unwrap();
        assert_eq!(path.segments(), &["a", "b", "c"]);
        assert_eq!(path.joined(), "a/b/c");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(KeyPath::parse(""), Err(Error::InvalidKey(_))));
        assert!(matches!(KeyPath::parse("   "), Err(Error::InvalidKey(_))));
        assert!(matches!(KeyPath::parse("///"), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_prefix_allows_root() {
        assert!(KeyPath::prefix("").is_root());
        assert!(KeyPath::prefix("/").is_root());
        assert_eq!(KeyPath::prefix("/a/b/").joined(), "a/b");
    }

    #[test]
    fn test_parse_cleans_dot_segments() {
        assert_eq!(KeyPath::parse("a/./b").unwrap().joined(), "a/b");
        assert_eq!(KeyPath::parse("./a/x/../b/.").unwrap().joined(), "a/b");
        assert_eq!(KeyPath::parse("../../a").unwrap().joined(), "a");
        assert!(matches!(KeyPath::parse("./.."), Err(Error::InvalidKey(_))));
        assert!(matches!(KeyPath::parse("a/.."), Err(Error::InvalidKey(_))));
        assert!(KeyPath::prefix("a/..").is_root());
    }

    #[test]
    fn test_split_last() {
        let path = KeyPath::parse("a/b/c").unwrap();
        let (parent, name) = path.split_last().unwrap();
        assert_eq!(parent, &["a", "b"]);
        assert_eq!(name, "c");
        assert!(KeyPath::root().split_last().is_none());
    }

    #[test]
    fn test_ancestor() {
        let path = KeyPath::parse("x/y").unwrap();
        assert_eq!(path.to_string(), "x/y");
        assert_eq!(path.ancestor(1).joined(), "x");
        assert_eq!(path.ancestor(5), path);
    }
}

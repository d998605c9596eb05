//! Store trait definitions

use crate::watch::WatchEvent;
use crate::Result;
use std::collections::BTreeSet;

/// A hierarchical key-value store
///
/// Keys are `/`-delimited paths. Intermediate segments are buckets and only
/// the last segment holds a value.
///
/// Implementations can be:
/// - In-memory (see [`crate::MemStore`])
/// - Remote configuration services with the same contract
pub trait Kv: Send + Sync {
    /// Get a copy of the value stored at `key`
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Store `value` at a new key. Never overwrites an existing key.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete `key` and everything below it
    fn delete(&self, key: &str) -> Result<()>;

    /// Full paths of every leaf below `prefix` (`""` is the root)
    fn enumerate(&self, prefix: &str) -> Result<BTreeSet<String>>;
}

/// A key-value store whose values can be updated and watched
pub trait RtConf: Kv {
    /// Replace the value of an existing leaf and release its watchers
    fn update(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Block until `key` is updated or the store's watch timeout elapses
    ///
    /// Both outcomes are successes; the event tells them apart.
    fn watch(&self, key: &str) -> Result<WatchEvent>;
}

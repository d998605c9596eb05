//! In-memory store backed by a path trie

use super::{Kv, RtConf};
use crate::config::StoreConfig;
use crate::trie::{KeyPath, PathTrie};
use crate::watch::{WatchEvent, WatchRegistry, Watcher};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// An in-memory hierarchical store with watch support
///
/// Reads take a shared lock on the trie and mutations an exclusive one, so
/// each operation is atomic with respect to the others. Watchers live in a
/// separate registry and never hold the trie lock while waiting.
///
/// The store is `Send + Sync`; share it between threads with an `Arc`.
#[derive(Debug)]
pub struct MemStore {
    namespace: String,
    tree: RwLock<PathTrie>,
    watchers: Arc<WatchRegistry>,
    watch_timeout: Duration,
}

impl MemStore {
    /// Create a store with the default configuration
    pub fn new() -> Self {
        let config = StoreConfig::default();
        MemStore {
            namespace: config.namespace.clone(),
            tree: RwLock::new(PathTrie::new()),
            watchers: Arc::new(WatchRegistry::new()),
            watch_timeout: config.watch_timeout(),
        }
    }

    /// Create a store from a validated configuration
    pub fn with_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(MemStore {
            namespace: config.namespace.clone(),
            tree: RwLock::new(PathTrie::new()),
            watchers: Arc::new(WatchRegistry::new()),
            watch_timeout: config.watch_timeout(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Default time a watch blocks without an update
    pub fn watch_timeout(&self) -> Duration {
        self.watch_timeout
    }

    /// Number of leaves in the store
    pub fn len(&self) -> usize {
        self.tree.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a watcher on `key` without blocking
    ///
    /// The returned watcher is released by any update to `key` made after
    /// this call. Use it to register before triggering the update.
    pub fn subscribe(&self, key: &str) -> Result<Watcher> {
        let path = KeyPath::parse(key)?;
        Ok(self.watchers.register(&path, self.watch_timeout))
    }

    /// Like [`RtConf::watch`], with an explicit timeout
    pub fn watch_for(&self, key: &str, timeout: Duration) -> Result<WatchEvent> {
        Ok(self.subscribe(key)?.wait_timeout(timeout))
    }

    /// Number of watchers currently blocked on `key`
    pub fn pending_watchers(&self, key: &str) -> Result<usize> {
        let path = KeyPath::parse(key)?;
        Ok(self.watchers.pending(&path))
    }

    /// Remove the nodes an update created while looking for a missing key
    fn rollback(&self, tree: &mut PathTrie, path: &KeyPath, created_at: usize) -> Result<()> {
        let created = path.ancestor(created_at + 1);
        tree.remove(&created).map(|_| ()).map_err(|cleanup| {
            warn!(
                namespace = %self.namespace,
                key = %path,
                error = %cleanup,
                "failed to roll back update of missing key"
            );
            Error::Internal {
                key: path.joined(),
                source: Box::new(cleanup),
            }
        })
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Kv for MemStore {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = KeyPath::parse(key)?;
        let tree = self.tree.read();
        let node = tree.get(&path)?;

        if !node.is_leaf() {
            return Err(Error::NotALeaf(path.joined()));
        }
        trace!(namespace = %self.namespace, key = %path, "get");

        node.value()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::NotALeaf(path.joined()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = KeyPath::parse(key)?;
        let mut tree = self.tree.write();
        let insertion = tree.insert_path(&path)?;

        if insertion.existed() {
            return Err(Error::KeyExists(path.joined()));
        }
        if !insertion.node.set_value(value) {
            return Err(Error::BucketConflict(format!(
                "{} already has children",
                path
            )));
        }

        debug!(namespace = %self.namespace, key = %path, len = value.len(), "set");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = KeyPath::parse(key)?;
        let removed = self.tree.write().remove(&path)?;
        debug!(
            namespace = %self.namespace,
            key = %path,
            leaves = removed.leaf_count(),
            "delete"
        );
        Ok(())
    }

    fn enumerate(&self, prefix: &str) -> Result<BTreeSet<String>> {
        let path = KeyPath::prefix(prefix);
        let keys = self.tree.read().leaves(&path)?;
        trace!(namespace = %self.namespace, prefix = %path, count = keys.len(), "enumerate");
        Ok(keys)
    }
}

impl RtConf for MemStore {
    fn update(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = KeyPath::parse(key)?;
        {
            let mut tree = self.tree.write();
            let insertion = tree.insert_path(&path)?;

            if let Some(created_at) = insertion.created_at {
                self.rollback(&mut tree, &path, created_at)?;
                return Err(Error::KeyNotFound(path.joined()));
            }
            if !insertion.node.set_value(value) {
                return Err(Error::BucketConflict(format!(
                    "{} is a bucket and cannot hold a value",
                    path
                )));
            }
        }

        let released = self.watchers.notify(&path);
        debug!(
            namespace = %self.namespace,
            key = %path,
            len = value.len(),
            released,
            "update"
        );
        Ok(())
    }

    fn watch(&self, key: &str) -> Result<WatchEvent> {
        self.watch_for(key, self.watch_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "a/b/c/myKey";

    #[test]
    fn test_get_set() {
        let store = MemStore::new();
        store.set(KEY, b"val").unwrap();
        assert_eq!(store.get(KEY).unwrap(), b"val");
        assert_eq!(store.get("/a/b/c/myKey/").unwrap(), b"val");
    }

    #[test]
    fn test_get_returns_copy() {
        let store = MemStore::new();
        let mut value = b"val".to_vec();
        store.set(KEY, &value).unwrap();
        value[0] = b'X';

        let mut fetched = store.get(KEY).unwrap();
        assert_eq!(fetched, b"val");
        fetched.clear();
        assert_eq!(store.get(KEY).unwrap(), b"val");
    }

    #[test]
    fn test_get_wrong_key_and_bucket() {
        let store = MemStore::new();
        store.set(KEY, b"val").unwrap();

        assert!(matches!(store.get("wrongKey"), Err(Error::KeyNotFound(_))));
        assert!(matches!(store.get("/a/b/d/this"), Err(Error::KeyNotFound(_))));
        assert!(matches!(store.get("/a/b/c"), Err(Error::NotALeaf(_))));
        assert!(matches!(store.get(""), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_dot_segments_address_same_key() {
        let store = MemStore::new();
        store.set("a/./b", b"v").unwrap();
        assert_eq!(store.get("a/b").unwrap(), b"v");
        assert_eq!(store.get("a/x/../b").unwrap(), b"v");
        assert!(matches!(store.set("a/b", b"w"), Err(Error::KeyExists(_))));
        assert!(matches!(store.set("a/..", b"w"), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_set_empty_key() {
        let store = MemStore::new();
        assert!(matches!(store.set("", b"val"), Err(Error::InvalidKey(_))));
        assert!(matches!(store.set("/", b"val"), Err(Error::InvalidKey(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_length_value() {
        let store = MemStore::new();
        store.set("k", &[]).unwrap();
        let value = store.get("k").unwrap();
        assert!(value.is_empty());
        assert_eq!(store.enumerate("").unwrap().len(), 1);
    }

    #[test]
    fn test_set_never_overwrites() {
        let store = MemStore::new();
        store.set(KEY, b"v1").unwrap();
        assert!(matches!(store.set(KEY, b"v2"), Err(Error::KeyExists(_))));
        assert!(matches!(store.set("a/b", b"v2"), Err(Error::KeyExists(_))));
        assert_eq!(store.get(KEY).unwrap(), b"v1");
    }

    #[test]
    fn test_set_below_leaf_conflicts() {
        let store = MemStore::new();
        store.set("a/b", b"leaf").unwrap();
        assert!(matches!(
            store.set("a/b/c", b"x"),
            Err(Error::BucketConflict(_))
        ));
        assert_eq!(store.get("a/b").unwrap(), b"leaf");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_existing() {
        let store = MemStore::new();
        store.set(KEY, b"v1").unwrap();
        store.update(KEY, b"v2").unwrap();
        assert_eq!(store.get(KEY).unwrap(), b"v2");
    }

    #[test]
    fn test_update_missing_leaves_no_artifacts() {
        let store = MemStore::new();
        store.set("a/x", b"1").unwrap();

        assert!(matches!(
            store.update("a/b/c/d", b"v"),
            Err(Error::KeyNotFound(_))
        ));
        assert!(matches!(store.get("a/b/c/d"), Err(Error::KeyNotFound(_))));
        assert!(matches!(store.get("a/b"), Err(Error::KeyNotFound(_))));
        assert_eq!(
            store.enumerate("a").unwrap(),
            BTreeSet::from(["a/x".to_string()])
        );
    }

    #[test]
    fn test_update_bucket_conflicts() {
        let store = MemStore::new();
        store.set(KEY, b"v").unwrap();
        assert!(matches!(
            store.update("a/b", b"v"),
            Err(Error::BucketConflict(_))
        ));
        assert_eq!(store.enumerate("a").unwrap().len(), 1);
    }

    #[test]
    fn test_update_below_leaf_conflicts() {
        let store = MemStore::new();
        store.set("a/b", b"leaf").unwrap();
        assert!(matches!(
            store.update("a/b/c", b"x"),
            Err(Error::BucketConflict(_))
        ));
        assert_eq!(store.get("a/b").unwrap(), b"leaf");
    }

    #[test]
    fn test_delete_key_twice() {
        let store = MemStore::new();
        store.set(KEY, b"val").unwrap();
        store.delete(KEY).unwrap();
        assert!(matches!(store.get(KEY), Err(Error::KeyNotFound(_))));
        assert!(matches!(store.delete(KEY), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn test_delete_tree() {
        let store = MemStore::new();
        store.set("a/b/c/x", b"1").unwrap();
        store.set("a/b/c/y", b"2").unwrap();
        store.delete("a/b").unwrap();

        assert!(store.get("a/b/c/x").unwrap_err().is_not_found());
        assert!(store.get("a/b/c/y").unwrap_err().is_not_found());
        assert!(store.is_empty());
    }

    #[test]
    fn test_enumerate_and_delete() {
        let store = MemStore::new();
        store.set("a/b/c/k1", b"val").unwrap();
        store.set("a/b/c/k2", b"other").unwrap();

        let keys = store.enumerate("a/b").unwrap();
        assert_eq!(
            keys,
            BTreeSet::from(["a/b/c/k1".to_string(), "a/b/c/k2".to_string()])
        );

        store.delete("a/b/c/k1").unwrap();
        assert_eq!(
            store.enumerate("/a/b/").unwrap(),
            BTreeSet::from(["a/b/c/k2".to_string()])
        );

        store.delete("a/b/c/k2").unwrap();
        assert!(store.enumerate("/a/b/").unwrap().is_empty());
    }

    #[test]
    fn test_enumerate_missing_prefix() {
        let store = MemStore::new();
        assert!(store.enumerate("").unwrap().is_empty());
        assert!(matches!(store.enumerate("nope"), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn test_watch_times_out() {
        let config = StoreConfig {
            watch_timeout_ms: 20,
            ..StoreConfig::default()
        };
        let store = MemStore::with_config(&config).unwrap();
        assert_eq!(store.watch(KEY).unwrap(), WatchEvent::TimedOut);
        assert_eq!(store.pending_watchers(KEY).unwrap(), 0);
        assert!(matches!(store.watch(""), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_subscribe_then_update() {
        let store = MemStore::new();
        store.set(KEY, b"v1").unwrap();
        let watcher = store.subscribe(KEY).unwrap();
        assert_eq!(store.pending_watchers(KEY).unwrap(), 1);

        store.update(KEY, b"v2").unwrap();
        assert_eq!(store.pending_watchers(KEY).unwrap(), 0);
        assert_eq!(
            watcher.wait_timeout(Duration::from_secs(5)),
            WatchEvent::Updated
        );
    }

    #[test]
    fn test_watch_for_unbounded_timeout() {
        let store = Arc::new(MemStore::new());
        store.set(KEY, b"v1").unwrap();

        let watching = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.watch_for(KEY, Duration::MAX))
        };
        while store.pending_watchers(KEY).unwrap() == 0 {
            std::thread::sleep(Duration::from_millis(5));
        }

        store.update(KEY, b"v2").unwrap();
        assert_eq!(watching.join().unwrap().unwrap(), WatchEvent::Updated);
    }

    #[test]
    fn test_set_and_delete_do_not_notify() {
        let store = MemStore::new();
        let watcher = store.subscribe(KEY).unwrap();
        store.set(KEY, b"v").unwrap();
        store.delete(KEY).unwrap();
        assert_eq!(store.pending_watchers(KEY).unwrap(), 1);
        assert_eq!(
            watcher.wait_timeout(Duration::from_millis(20)),
            WatchEvent::TimedOut
        );
    }

    #[test]
    fn test_failed_update_does_not_notify() {
        let store = MemStore::new();
        let watcher = store.subscribe(KEY).unwrap();
        assert!(store.update(KEY, b"v").is_err());
        assert_eq!(
            watcher.wait_timeout(Duration::from_millis(20)),
            WatchEvent::TimedOut
        );
    }

    #[test]
    fn test_with_config_validates() {
        let config = StoreConfig {
            namespace: String::new(),
            ..StoreConfig::default()
        };
        assert!(matches!(
            MemStore::with_config(&config),
            Err(Error::Config(_))
        ));
    }
}

//! # rtconf
//!
//! A hierarchical, path-addressed key-value store with change notification.
//!
//! Keys are `/`-delimited paths. Intermediate segments form buckets and only
//! the last segment of a key holds a value, so the store behaves like a small
//! file system for configuration values.
//!
//! ## Core Concepts
//!
//! - **Buckets**: nodes with children and no value (like directories)
//! - **Leaves**: nodes with a value and no children (like files)
//! - **Watchers**: callers blocked until a key is updated or a timeout elapses
//! - **Namespace**: the root under which a store keeps its keys
//!
//! ## Example
//!
//! ```
//! use rtconf::{Kv, MemStore, RtConf};
//!
//! let store = MemStore::new();
//! store.set("service/db/url", b"postgres://localhost")?;
//! store.update("service/db/url", b"postgres://replica")?;
//! assert_eq!(store.get("service/db/url")?, b"postgres://replica");
//! assert_eq!(store.enumerate("service")?.len(), 1);
//! # Ok::<(), rtconf::Error>(())
//! ```

pub mod config;
pub mod script;
pub mod store;
pub mod trie;
pub mod watch;

mod error;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use store::{Kv, MemStore, RtConf};
pub use trie::KeyPath;
pub use watch::{WatchEvent, Watcher};

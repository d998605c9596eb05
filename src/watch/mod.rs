//! Change notification for individual keys
//!
//! A watcher blocks until the value at its exact path is updated or its
//! timeout elapses, whichever comes first.

mod registry;

pub use registry::{WatchRegistry, Watcher};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default time a watcher waits for an update
pub const DEFAULT_WATCH_TIMEOUT_MS: u64 = 60_000;

/// Why a watcher was released
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchEvent {
    /// The value at the watched path was updated
    Updated,
    /// The timeout elapsed first
    TimedOut,
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchEvent::Updated => f.write_str("updated"),
            WatchEvent::TimedOut => f.write_str("timed_out"),
        }
    }
}

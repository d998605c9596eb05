//! Per-path registry of blocked watchers

use super::WatchEvent;
use crate::trie::KeyPath;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WaitState {
    Waiting,
    Notified,
}

/// Wait handle for a single watcher
#[derive(Debug)]
struct Waiter {
    id: u64,
    state: Mutex<WaitState>,
    cond: Condvar,
}

impl Waiter {
    fn new(id: u64) -> Self {
        Waiter {
            id,
            state: Mutex::new(WaitState::Waiting),
            cond: Condvar::new(),
        }
    }

    fn notify(&self) {
        let mut state = self.state.lock();
        *state = WaitState::Notified;
        self.cond.notify_all();
    }

    fn wait_for(&self, timeout: Duration) -> WatchEvent {
        // A timeout past the clock's range waits for a notification only.
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        while *state == WaitState::Waiting {
            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.cond.wait(&mut state),
            }
        }
        match *state {
            WaitState::Notified => WatchEvent::Updated,
            WaitState::Waiting => WatchEvent::TimedOut,
        }
    }
}

/// Registry of pending watchers, keyed by normalized path
///
/// The registry lock is only held to add, remove or take handles. Waiting
/// happens on each watcher's own condition variable.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    waiters: Mutex<HashMap<String, Vec<Arc<Waiter>>>>,
    next_id: AtomicU64,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new watcher on `path`
    ///
    /// The watcher only observes notifications issued after this call.
    pub fn register(self: &Arc<Self>, path: &KeyPath, timeout: Duration) -> Watcher {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let waiter = Arc::new(Waiter::new(id));
        let key = path.joined();

        self.waiters
            .lock()
            .entry(key.clone())
            .or_default()
            .push(Arc::clone(&waiter));
        trace!(path = %key, id, "watcher registered");

        Watcher {
            registry: Arc::clone(self),
            path: key,
            waiter,
            timeout,
        }
    }

    /// Release every watcher on exactly `path` and drop its registration
    ///
    /// Returns the number of watchers released.
    pub fn notify(&self, path: &KeyPath) -> usize {
        let key = path.joined();
        let waiters = self.waiters.lock().remove(&key).unwrap_or_default();
        for waiter in &waiters {
            waiter.notify();
        }
        if !waiters.is_empty() {
            trace!(path = %key, released = waiters.len(), "watchers notified");
        }
        waiters.len()
    }

    /// Number of watchers currently blocked on `path`
    pub fn pending(&self, path: &KeyPath) -> usize {
        self.waiters
            .lock()
            .get(&path.joined())
            .map_or(0, Vec::len)
    }

    /// Number of paths with at least one pending watcher
    pub fn watched_paths(&self) -> usize {
        self.waiters.lock().len()
    }

    fn deregister(&self, path: &str, id: u64) {
        let mut waiters = self.waiters.lock();
        if let Some(list) = waiters.get_mut(path) {
            list.retain(|w| w.id != id);
            if list.is_empty() {
                waiters.remove(path);
            }
        }
    }
}

/// A registered watcher that has not been waited on yet
///
/// Dropping a watcher removes it from the registry.
#[derive(Debug)]
pub struct Watcher {
    registry: Arc<WatchRegistry>,
    path: String,
    waiter: Arc<Waiter>,
    timeout: Duration,
}

impl Watcher {
    /// Block until the path is updated or the default timeout elapses
    pub fn wait(self) -> WatchEvent {
        let timeout = self.timeout;
        self.wait_timeout(timeout)
    }

    /// Block until the path is updated or `timeout` elapses
    pub fn wait_timeout(self, timeout: Duration) -> WatchEvent {
        let event = self.waiter.wait_for(timeout);
        trace!(path = %self.path, id = self.waiter.id, ?event, "watcher released");
        event
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.registry.deregister(&self.path, self.waiter.id);
    }
}

//! Listener registry
//!
//! Tracks, per device path, whether a backend-side asynchronous read
//! listener is believed active. This is client-side belief, not ground
//! truth: the backend's actual listener state is not observable from this
//! layer. Starting a listener is assumed idempotent but not free, so it is
//! requested at most once per path unless a dispatch failure suggests the
//! backend-side state was lost.

use std::collections::HashSet;

/// Paths for which a backend read listener is believed active
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    active: HashSet<String>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_listener(&self, path: &str) -> bool {
        self.active.contains(path)
    }

    pub fn mark_started(&mut self, path: &str) {
        self.active.insert(path.to_string());
    }

    /// Forget a path so the next send re-requests its listener
    pub fn mark_failed(&mut self, path: &str) {
        self.active.remove(path);
    }
}

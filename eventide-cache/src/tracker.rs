//! Tracks keys with a background refresh in flight.

use std::collections::HashSet;

use eventide_core::CacheKey;

/// Set of keys currently being revalidated in the background.
///
/// [`try_begin`](Self::try_begin) is the only way a refresh gets started,
/// so at most one refresh per key is in flight. Like the entry store it is
/// not synchronized on its own.
#[derive(Debug, Default)]
pub struct RevalidationTracker {
    in_flight: HashSet<CacheKey>,
}

impl RevalidationTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as revalidating. Returns false if it already was.
    pub fn try_begin(&mut self, key: &str) -> bool {
        if self.in_flight.contains(key) {
            return false;
        }
        self.in_flight.insert(key.to_owned())
    }

    /// Clears `key`. Idempotent.
    pub fn end(&mut self, key: &str) {
        self.in_flight.remove(key);
    }

    /// Returns true if `key` is being revalidated.
    pub fn contains(&self, key: &str) -> bool {
        self.in_flight.contains(key)
    }

    /// Forgets every key.
    pub fn clear(&mut self) {
        self.in_flight.clear();
    }

    /// Number of refreshes in flight.
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns true if nothing is being revalidated.
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

//! Entry storage.
//!
//! Holds values and the instant they were stored. Knows nothing about
//! policies; callers compare [`CacheEntry::age`] against a TTL.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use eventide_core::CacheKey;

/// A stored value and when it was stored.
#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    /// Cached value
    pub value: V,
    /// When the value was put
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Age of the entry at `now`. Zero if `now` precedes `stored_at`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }
}

/// Map from cache key to [`CacheEntry`].
///
/// Not synchronized; the cache manager guards it together with the
/// revalidation tracker behind one lock.
#[derive(Debug)]
pub struct EntryStore<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
}

impl<V> EntryStore<V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn put(&mut self, key: impl Into<CacheKey>, value: V, now: Instant) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: now,
            },
        );
    }

    /// Removes the entry for `key`. Returns true if one was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry the predicate accepts and returns their keys.
    pub fn delete_where<P>(&mut self, mut predicate: P) -> Vec<CacheKey>
    where
        P: FnMut(&str, &CacheEntry<V>) -> bool,
    {
        let doomed: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(key, entry)| predicate(key, entry))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            self.entries.remove(key);
        }
        doomed
    }

    /// Snapshot of all keys, in no particular order.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.keys().cloned().collect()
    }

    /// Returns true if `key` has an entry.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for EntryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut keys: Vec<CacheKey>) -> Vec<CacheKey> {
        keys.sort();
        keys
    }

    #[test]
    fn test_put_get() {
        let mut store = EntryStore::new();
        let now = Instant::now();
        store.put("event:5", 5u32, now);

        let entry = store.get("event:5").unwrap();
        assert_eq!(entry.value, 5);
        assert_eq!(entry.stored_at, now);
        assert!(store.get("event:6").is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let mut store = EntryStore::new();
        let first = Instant::now();
        let later = first + Duration::from_secs(1);
        store.put("tags", "old", first);
        store.put("tags", "new", later);

        assert_eq!(store.len(), 1);
        let entry = store.get("tags").unwrap();
        assert_eq!(entry.value, "new");
        assert_eq!(entry.stored_at, later);
    }

    #[test]
    fn test_delete() {
        let mut store = EntryStore::new();
        store.put("event:5", 5u32, Instant::now());

        assert!(store.delete("event:5"));
        assert!(!store.delete("event:5"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_where_prefix() {
        let mut store = EntryStore::new();
        let now = Instant::now();
        for key in ["events:all", "event:5", "event:6", "organizations"] {
            store.put(key, (), now);
        }

        let removed = store.delete_where(|key, _| key.starts_with("event"));
        assert_eq!(sorted(removed), vec!["event:5", "event:6", "events:all"]);
        assert_eq!(store.keys(), vec!["organizations"]);
    }

    #[test]
    fn test_delete_where_nothing_matches() {
        let mut store = EntryStore::new();
        store.put("tags", (), Instant::now());
        assert!(store.delete_where(|key, _| key.starts_with("user")).is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_age() {
        let now = Instant::now();
        let entry = CacheEntry {
            value: (),
            stored_at: now,
        };
        assert_eq!(entry.age(now + Duration::from_millis(150)), Duration::from_millis(150));
        assert_eq!(entry.age(now), Duration::ZERO);
    }

    #[test]
    fn test_clear() {
        let mut store = EntryStore::new();
        store.put("a", 1, Instant::now());
        store.put("b", 2, Instant::now());
        store.clear();
        assert!(store.is_empty());
        assert!(!store.contains("a"));
    }
}

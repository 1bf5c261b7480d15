//! # LRU Cache
//!
//! Bounded least-recently-used cache for derived, immutable per-route data.
//! The route catalog keeps segmentations here keyed by route id so that
//! switching back and forth between routes does not re-segment them. Entries
//! are only ever replaced whole, never mutated in place.

use std::collections::HashMap;
use std::hash::Hash;

/// LRU cache with linear-scan eviction.
///
/// Capacities are small (one entry per route), so scanning for the oldest
/// entry is cheaper than maintaining a linked list.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    entries: HashMap<K, CacheEntry<V>>,
    access_counter: u64,
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    last_access: u64,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            access_counter: 0,
        }
    }

    fn touch(&mut self) -> u64 {
        self.access_counter += 1;
        self.access_counter
    }

    /// Get a cloned value, marking it as recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let stamp = self.touch();
        self.entries.get_mut(key).map(|entry| {
            entry.last_access = stamp;
            entry.value.clone()
        })
    }

    /// Insert a value, evicting the least recently used entry if full.
    pub fn insert(&mut self, key: K, value: V) {
        let stamp = self.touch();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                last_access: stamp,
            },
        );
    }

    /// Return the cached value or compute, cache and return it.
    ///
    /// Errors from `compute` are returned as-is and nothing is cached.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Check if the cache contains a key without touching it.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_oldest(&mut self) {
        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(k, _)| k.clone());

        if let Some(key) = oldest_key {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_insert() {
        let mut cache: LruCache<u32, &str> = LruCache::new(3);
        cache.insert(1, "one");
        cache.insert(2, "two");

        assert_eq!(cache.get(&1), Some("one"));
        assert_eq!(cache.get(&3), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_eviction_prefers_least_recent() {
        let mut cache: LruCache<u32, u32> = LruCache::new(2);
        cache.insert(1, 10);
        cache.insert(2, 20);
        cache.get(&1);
        cache.insert(3, 30);

        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
    }

    #[test]
    fn test_replace_does_not_evict() {
        let mut cache: LruCache<u32, u32> = LruCache::new(2);
        cache.insert(1, 10);
        cache.insert(2, 20);
        cache.insert(2, 21);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), Some(21));
        assert!(cache.contains(&1));
    }

    #[test]
    fn test_get_or_try_insert_with() {
        let mut cache: LruCache<u32, u32> = LruCache::new(2);
        let mut calls = 0;

        let v: Result<u32, ()> = cache.get_or_try_insert_with(7, || {
            calls += 1;
            Ok(70)
        });
        assert_eq!(v, Ok(70));

        let v: Result<u32, ()> = cache.get_or_try_insert_with(7, || {
            calls += 1;
            Ok(0)
        });
        assert_eq!(v, Ok(70));
        assert_eq!(calls, 1);

        let err: Result<u32, &str> = cache.get_or_try_insert_with(8, || Err("bad"));
        assert_eq!(err, Err("bad"));
        assert!(!cache.contains(&8));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(1, 1);
        cache.insert(2, 2);
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
    }
}

//! Cache Store Module
//!
//! Key-value storage with per-entry TTL and a stale-read path. Stale entries
//! are never purged in the background; they are evicted lazily by `get` or
//! removed explicitly.

use std::collections::HashMap;

use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock, DEFAULT_TTL_MS};

// == Cache Store ==
/// In-memory cache that keeps stale entries around for fallback reads.
#[derive(Debug)]
pub struct CacheStore<T, C = SystemClock> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Default TTL in milliseconds for `set` calls without one
    default_ttl: u64,
    /// Time source for write timestamps and freshness checks
    clock: C,
}

impl<T> CacheStore<T, SystemClock> {
    // == Constructor ==
    /// Creates an empty store on wall-clock time.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL in milliseconds for entries set without one
    pub fn new(default_ttl: u64) -> Self {
        Self::with_clock(default_ttl, SystemClock)
    }
}

impl<T> Default for CacheStore<T, SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_MS)
    }
}

impl<T, C: Clock> CacheStore<T, C> {
    /// Creates an empty store reading time from `clock`.
    pub fn with_clock(default_ttl: u64, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
            clock,
        }
    }

    // == Set ==
    /// Stores `data` under `key`, replacing any previous entry.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `data` - The payload
    /// * `ttl` - Optional TTL in milliseconds (uses the default if None)
    pub fn set(&mut self, key: impl Into<String>, data: T, ttl: Option<u64>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(data, self.clock.now_ms(), ttl);
        self.entries.insert(key.into(), entry);
    }

    // == Get ==
    /// Reads a fresh value, evicting the entry if it has gone stale.
    ///
    /// Expired and absent keys both return `None`. Use `get_stale` to read an
    /// entry without evicting it.
    pub fn get(&mut self, key: &str) -> Option<T>
    where
        T: Clone,
    {
        let now = self.clock.now_ms();
        let fresh = self.entries.get(key)?.is_fresh(now);

        if fresh {
            self.entries.get(key).map(|entry| entry.data.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    // == Peek Fresh ==
    /// Reads a fresh value without evicting anything.
    ///
    /// Stale entries are left in place so they remain available to
    /// `get_stale`.
    pub fn peek_fresh(&self, key: &str) -> Option<&T> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| &entry.data)
    }

    // == Has ==
    /// Returns true if any entry exists for `key`, fresh or stale.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Delete ==
    /// Removes the entry for `key`, returning whether one existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Get Stale ==
    /// Reads the stored payload regardless of freshness. Never evicts.
    pub fn get_stale(&self, key: &str) -> Option<&T> {
        self.entries.get(key).map(|entry| &entry.data)
    }

    // == Is Stale ==
    /// Returns true if `key` is absent or its freshness window has elapsed.
    pub fn is_stale(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .map_or(true, |entry| entry.is_stale(now))
    }

    // == Stats ==
    /// Classifies every stored entry as fresh or stale.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let mut stats = CacheStats::new();
        for entry in self.entries.values() {
            stats.record(entry.is_fresh(now));
        }
        stats
    }

    // == Invalidate ==
    /// Deletes every key containing `pattern`, or everything if None.
    ///
    /// Matching is plain substring containment. Returns the number of
    /// entries removed.
    pub fn invalidate(&mut self, pattern: Option<&str>) -> usize {
        let before = self.entries.len();
        match pattern {
            Some(pattern) => self.entries.retain(|key, _| !key.contains(pattern)),
            None => self.entries.clear(),
        }
        before - self.entries.len()
    }

    // == Keys ==
    /// Returns all stored keys, fresh or stale, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // == Length ==
    /// Returns the number of stored entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the TTL used for `set` calls without one.
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }
}

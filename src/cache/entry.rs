//! Cache Entry Module
//!
//! Defines a single cached payload together with its write time and TTL.

// == Cache Entry ==
/// Represents a single cache entry with its freshness window.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub data: T,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Milliseconds the entry stays fresh after `stored_at`
    pub ttl: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry written at `stored_at`.
    pub fn new(data: T, stored_at: u64, ttl: u64) -> Self {
        Self {
            data,
            stored_at,
            ttl,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the entry was written.
    ///
    /// A clock that moved backwards reads as age 0.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.stored_at)
    }

    // == Is Fresh ==
    /// Checks whether the entry is still inside its freshness window.
    ///
    /// Boundary condition: an entry is fresh while `age <= ttl`, so it is still
    /// served at exactly `stored_at + ttl`. A zero TTL is never fresh; such
    /// entries only serve stale reads.
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        self.ttl > 0 && self.age_ms(now_ms) <= self.ttl
    }

    // == Is Stale ==
    /// Checks whether the freshness window has elapsed.
    pub fn is_stale(&self, now_ms: u64) -> bool {
        !self.is_fresh(now_ms)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_fresh_within_ttl() {
        let entry = CacheEntry::new("value", 1_000, 500);

        assert!(entry.is_fresh(1_000));
        assert!(entry.is_fresh(1_499));
        assert!(!entry.is_stale(1_200));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("value", 1_000, 500);

        // Fresh at exactly stored_at + ttl, stale one millisecond later
        assert!(entry.is_fresh(1_500));
        assert!(entry.is_stale(1_501));
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let entry = CacheEntry::new("value", 1_000, 0);

        assert!(entry.is_stale(1_000));
        assert!(!entry.is_fresh(999));
    }

    #[test]
    fn test_clock_behind_write_time() {
        let entry = CacheEntry::new("value", 5_000, 100);

        assert_eq!(entry.age_ms(4_000), 0);
        assert!(entry.is_fresh(4_000));
    }
}

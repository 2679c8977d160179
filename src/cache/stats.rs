//! Cache Statistics Module
//!
//! Point-in-time classification of stored entries by freshness.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of how many stored entries are fresh and how many are stale.
///
/// Computed by scanning the store; `valid + stale == total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of entries in the store, fresh or stale
    pub total: usize,
    /// Entries still inside their freshness window
    pub valid: usize,
    /// Entries past their freshness window but not yet evicted
    pub stale: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a snapshot with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record ==
    /// Counts one entry as fresh or stale.
    pub fn record(&mut self, fresh: bool) {
        self.total += 1;
        if fresh {
            self.valid += 1;
        } else {
            self.stale += 1;
        }
    }
}

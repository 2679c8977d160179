//! Cache Module
//!
//! Provides an in-memory TTL cache that keeps stale entries for fallback
//! reads, and a shared handle that wraps fetches with that fallback.

mod clock;
mod entry;
pub mod keys;
mod shared;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use keys::DEFAULT_TTL_MS;
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::CacheStore;

//! Feed Cache - A stale-tolerant TTL cache and the feed service built on it
//!
//! Repeated reads inside a freshness window are served from memory; when the
//! upstream fails, the last good copy is served instead of an error.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;

pub use api::AppState;
pub use cache::{CacheStore, SharedCache};
pub use config::Config;

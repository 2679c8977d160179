//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.
//! Cache TTLs are constants in `cache::keys` and are not configurable here.

use std::env;

/// Publisher's market-insights RSS feed
pub const DEFAULT_FEED_URL: &str =
    "https://www.simplifyingthemarket.com/en/feed?a=956758-ef2edda2f940e018328655620ea05f18";
/// Publisher URL tried when the primary feed fails
pub const DEFAULT_FEED_ALTERNATE_URL: &str =
    "https://www.simplifyingthemarket.com/en/?a=956758-ef2edda2f940e018328655620ea05f18";

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Primary upstream feed URL
    pub feed_url: String,
    /// Fallback feed URL tried when the primary fails
    pub feed_alternate_url: Option<String>,
    /// Per-request timeout for upstream fetches, in seconds
    pub feed_timeout_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `FEED_URL` - Primary feed URL (default: publisher feed)
    /// - `FEED_ALTERNATE_URL` - Fallback feed URL (default: publisher page; empty disables)
    /// - `FEED_TIMEOUT_SECS` - Upstream request timeout (default: 10)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            feed_url: env::var("FEED_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            feed_alternate_url: match env::var("FEED_ALTERNATE_URL") {
                Ok(url) => Some(url).filter(|v| !v.is_empty()),
                Err(_) => Some(DEFAULT_FEED_ALTERNATE_URL.to_string()),
            },
            feed_timeout_secs: env::var("FEED_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            feed_url: DEFAULT_FEED_URL.to_string(),
            feed_alternate_url: Some(DEFAULT_FEED_ALTERNATE_URL.to_string()),
            feed_timeout_secs: 10,
        }
    }
}

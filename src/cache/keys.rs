//! Cache Keys Module
//!
//! Well-known cache keys and the freshness window each one is stored with.

// == Default TTL ==
/// TTL applied when a caller does not pass one (1 hour).
pub const DEFAULT_TTL_MS: u64 = 3_600_000;

// == Keys ==
/// Market-insights feed payload
pub const KCM_FEED: &str = "kcm-feed";
/// Article list derived from the feed
pub const KCM_ARTICLES: &str = "kcm-articles";
/// Insights derived from the feed
pub const MARKET_INSIGHTS: &str = "market-insights";

// == TTL Table ==
/// Per-use-case TTLs in milliseconds.
pub mod ttl {
    /// Feed refreshed hourly
    pub const FEED: u64 = 3_600_000;
    /// Articles refreshed every two hours
    pub const ARTICLES: u64 = 7_200_000;
    /// Derived insights refreshed every 30 minutes
    pub const INSIGHTS: u64 = 1_800_000;
}

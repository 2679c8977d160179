//! Response DTOs for the feed service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /api/cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Entries in the cache, fresh or stale
    pub total: usize,
    /// Entries inside their freshness window
    pub valid: usize,
    /// Entries past their freshness window
    pub stale: usize,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            total: stats.total,
            valid: stats.valid,
            stale: stats.stale,
        }
    }
}

/// Response body for the invalidate endpoint (DELETE /api/cache)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Number of entries removed
    pub removed: usize,
    /// The pattern applied, None when the whole cache was cleared
    pub pattern: Option<String>,
}

impl InvalidateResponse {
    /// Creates a new InvalidateResponse
    pub fn new(removed: usize, pattern: Option<&str>) -> Self {
        Self {
            removed,
            pattern: pattern.map(str::to_string),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_from_cache_stats() {
        let mut stats = CacheStats::new();
        stats.record(true);
        stats.record(false);

        let resp = StatsResponse::from(stats);
        assert_eq!(resp.total, 2);
        assert_eq!(resp.valid, 1);
        assert_eq!(resp.stale, 1);
    }

    #[test]
    fn test_invalidate_response_serialize() {
        let json = serde_json::to_string(&InvalidateResponse::new(3, Some("kcm"))).unwrap();
        assert_eq!(json, r#"{"removed":3,"pattern":"kcm"}"#);

        let json = serde_json::to_string(&InvalidateResponse::new(0, None)).unwrap();
        assert_eq!(json, r#"{"removed":0,"pattern":null}"#);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"error":"Something went wrong"}"#);
    }
}

//! API Handlers
//!
//! HTTP request handlers for each feed service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::cache::{keys, SharedCache};
use crate::config::Config;
use crate::error::{ApiError, FeedError, Result};
use crate::feed::{FeedClient, FeedData, FeedSource};
use crate::models::{HealthResponse, InvalidateQuery, InvalidateResponse, StatsResponse};

/// CDN and browser caching policy for the feed response
pub const FEED_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=86400";

/// Application state shared across all handlers.
///
/// Holds the feed cache and the source it is filled from.
#[derive(Clone)]
pub struct AppState {
    /// Cache of normalized feeds, keyed by `cache::keys`
    pub cache: SharedCache<FeedData>,
    /// Upstream feed
    pub source: Arc<dyn FeedSource>,
}

impl AppState {
    /// Creates a new AppState with the given cache and source.
    pub fn new(cache: SharedCache<FeedData>, source: Arc<dyn FeedSource>) -> Self {
        Self { cache, source }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the HTTP feed client and an empty cache.
    pub fn from_config(config: &Config) -> std::result::Result<Self, FeedError> {
        let client = FeedClient::from_config(config)?;
        Ok(Self::new(SharedCache::default(), Arc::new(client)))
    }
}

/// Handler for GET /api/rss-feed
///
/// Serves the cached feed, fetching it when the cached copy is missing or
/// stale. During an upstream outage the last good copy is served as is.
pub async fn rss_feed_handler(State(state): State<AppState>) -> Result<Response> {
    let source = Arc::clone(&state.source);
    let feed = state
        .cache
        .get_cached_data(
            keys::KCM_FEED,
            || async move { source.fetch().await },
            Some(keys::ttl::FEED),
        )
        .await
        .map_err(|err| {
            error!(error = %err, "Error fetching feed");
            ApiError::from(err)
        })?;

    Ok(([(header::CACHE_CONTROL, FEED_CACHE_CONTROL)], Json(feed)).into_response())
}

/// Fallback for unsupported methods on the feed route.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Handler for GET /api/cache/stats
///
/// Returns the fresh/stale breakdown of cached entries.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().await.into())
}

/// Handler for DELETE /api/cache
///
/// Removes keys containing `?pattern=`, or clears everything without one.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(query): Query<InvalidateQuery>,
) -> Json<InvalidateResponse> {
    let pattern = query.pattern();
    let removed = state.cache.invalidate_cache(pattern).await;

    Json(InvalidateResponse::new(removed, pattern))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

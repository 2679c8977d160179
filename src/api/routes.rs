//! API Routes
//!
//! Configures the Axum router with all feed service endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, invalidate_handler, method_not_allowed, rss_feed_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/rss-feed` - Cached market-insights feed
/// - `GET /api/cache/stats` - Fresh/stale entry counts
/// - `DELETE /api/cache` - Invalidate by `?pattern=` or clear all
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route(
            "/api/rss-feed",
            get(rss_feed_handler).fallback(method_not_allowed),
        )
        .route("/api/cache/stats", get(stats_handler))
        .route("/api/cache", delete(invalidate_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

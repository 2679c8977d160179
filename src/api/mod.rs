//! API Module
//!
//! HTTP handlers and routing for the feed service REST API.
//!
//! # Endpoints
//! - `GET /api/rss-feed` - Cached market-insights feed
//! - `GET /api/cache/stats` - Cache statistics
//! - `DELETE /api/cache` - Cache invalidation
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

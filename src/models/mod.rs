//! Request and Response models for the feed service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies. The feed
//! payload itself lives in `feed::model`.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::InvalidateQuery;
pub use responses::{ErrorResponse, HealthResponse, InvalidateResponse, StatsResponse};

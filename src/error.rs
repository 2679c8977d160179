//! Error types for the feed service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Feed Error Enum ==
/// Failures while fetching or decoding the upstream feed.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Transport failure, including request timeouts
    #[error("Feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Failed to fetch feed: HTTP {0}")]
    Status(u16),

    /// Body was not well-formed XML
    #[error("Invalid feed document: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Document is not RSS or Atom, or failed validation
    #[error("Invalid feed structure: {0}")]
    Invalid(String),
}

// == API Error Enum ==
/// Errors surfaced by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Method not supported on this route
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Feed unavailable and no cached copy to fall back on
    #[error("Failed to fetch market insights. Please try again later.")]
    FeedUnavailable(#[source] FeedError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::FeedUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        ApiError::FeedUnavailable(err)
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

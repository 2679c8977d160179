//! Upstream feed client
//!
//! Fetches the market-insights RSS or Atom feed over HTTP and normalizes it. When the
//! primary URL fails, an alternate URL is tried before giving up.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, warn};

use super::model::FeedData;
use super::normalize::{normalize, validate};
use super::parse::parse_feed;
use crate::config::Config;
use crate::error::FeedError;

/// User agent sent with every feed request
const USER_AGENT: &str = "Mozilla/5.0 (compatible; CentennialHillsHomes/1.0)";

// == Feed Source ==
/// Anything that can produce a normalized feed.
///
/// The HTTP layer depends on this seam so tests can substitute fake sources.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedData, FeedError>;
}

// == Feed Client ==
/// Fetches the feed from the publisher with a per-request timeout.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    primary_url: String,
    alternate_url: Option<String>,
}

impl FeedClient {
    /// Creates a client for `primary_url` with an optional fallback URL.
    pub fn new(
        primary_url: impl Into<String>,
        alternate_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            primary_url: primary_url.into(),
            alternate_url: alternate_url.filter(|url| !url.is_empty()),
        })
    }

    /// Creates a client from service configuration.
    pub fn from_config(config: &Config) -> Result<Self, FeedError> {
        Self::new(
            config.feed_url.clone(),
            config.feed_alternate_url.clone(),
            Duration::from_secs(config.feed_timeout_secs),
        )
    }

    /// Fetches, parses, normalizes and validates the feed at `url`.
    pub async fn fetch_url(&self, url: &str) -> Result<FeedData, FeedError> {
        debug!(url, "fetching feed");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let raw = parse_feed(&body)?;
        let feed = normalize(raw, url, Utc::now());
        validate(&feed)?;

        debug!(url, articles = feed.articles.len(), "feed fetched");
        Ok(feed)
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch(&self) -> Result<FeedData, FeedError> {
        match self.fetch_url(&self.primary_url).await {
            Ok(feed) => Ok(feed),
            Err(err) => match &self.alternate_url {
                Some(alternate) => {
                    warn!(error = %err, "primary feed failed, trying alternate URL");
                    self.fetch_url(alternate).await
                }
                None => Err(err),
            },
        }
    }
}

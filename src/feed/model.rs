//! Feed data models
//!
//! Upstream feed entries as read from RSS or Atom, and the normalized shape
//! served to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback channel title
pub const DEFAULT_TITLE: &str = "Market Insights";
/// Fallback channel description
pub const DEFAULT_DESCRIPTION: &str = "Latest real estate market insights";
/// Fallback article author
pub const DEFAULT_AUTHOR: &str = "KCM Team";
/// Fallback article category
pub const DEFAULT_CATEGORY: &str = "Market Insights";

// == Upstream Document ==

/// Channel-level fields of an RSS or Atom document.
///
/// Every field is optional; missing values are filled in during normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeed {
    pub title: Option<String>,
    /// RSS `description` or Atom `subtitle`
    pub description: Option<String>,
    /// RSS `link` text or the Atom alternate link's `href`
    pub link: Option<String>,
    pub items: Vec<RawItem>,
}

/// One RSS `item` or Atom `entry`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem {
    /// RSS `guid` or Atom `id`
    pub id: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    /// RSS `description` or Atom `summary`
    pub description: Option<String>,
    /// RSS `content:encoded` or Atom `content`
    pub content: Option<String>,
    /// RSS `pubDate`, else Atom `published`, else `updated`
    pub published: Option<String>,
    /// RSS `author` or `dc:creator`, Atom `author/name`
    pub author: Option<String>,
    /// First category text (RSS) or `term` (Atom)
    pub category: Option<String>,
    /// URL of an image enclosure
    pub image: Option<String>,
}

// == Normalized Feed ==

/// Normalized feed served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedData {
    pub title: String,
    pub description: String,
    pub link: String,
    /// Newest first
    pub articles: Vec<Article>,
    /// When this copy was fetched, not when the upstream last changed
    pub last_updated: DateTime<Utc>,
}

/// A single normalized article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Plain text with markup stripped
    pub content: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub author: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Minutes at 200 words per minute
    pub read_time: u32,
    pub excerpt: String,
}

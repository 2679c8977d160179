//! Feed Module
//!
//! Upstream market-insights feed: data models, normalization rules, and the
//! HTTP client that fetches it.

pub mod client;
pub mod model;
pub mod normalize;
pub mod parse;

pub use client::{FeedClient, FeedSource};
pub use model::{Article, FeedData, RawFeed, RawItem};
pub use parse::parse_feed;

//! Feed normalization
//!
//! Turns an upstream `RawFeed` into the `FeedData` served to clients: markup
//! is stripped, entities decoded, defaults filled in, and articles ordered
//! newest first.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};

use super::model::{
    Article, FeedData, RawFeed, RawItem, DEFAULT_AUTHOR, DEFAULT_CATEGORY, DEFAULT_DESCRIPTION,
    DEFAULT_TITLE,
};
use crate::error::FeedError;

/// Reading speed used for `read_time`
const WORDS_PER_MINUTE: usize = 200;
/// Character budget for excerpts; one word is counted as five characters
const EXCERPT_LENGTH: usize = 150;

/// Entities decoded in feed text. Anything else is kept verbatim.
const ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&hellip;", "..."),
    ("&mdash;", "\u{2014}"),
    ("&ndash;", "\u{2013}"),
];

// == Patterns ==

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)<script[^>]*>[\s\S]*?</script>"));
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)<style[^>]*>[\s\S]*?</style>"));
static TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"<[^>]+>"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));
static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?i)<img[^>]+src=["']([^"']+)["'][^>]*>"#));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| compile(r"&[a-zA-Z0-9#]+;"));

/// Compiles a pattern literal from this module.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid pattern {pattern:?}: {err}"))
}

// == Normalize ==
/// Builds the served feed from an upstream document.
///
/// # Arguments
/// * `raw` - The parsed upstream document
/// * `feed_url` - URL the document came from; used when it has no link
/// * `now` - Fetch time, also the fallback for unparseable item dates
pub fn normalize(raw: RawFeed, feed_url: &str, now: DateTime<Utc>) -> FeedData {
    let mut articles: Vec<Article> = raw
        .items
        .into_iter()
        .filter(|item| item.title.as_deref().is_some_and(|t| !t.trim().is_empty()))
        .enumerate()
        .map(|(index, item)| normalize_item(item, index, now))
        .collect();

    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    FeedData {
        title: non_empty(raw.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description: non_empty(raw.description)
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        link: non_empty(raw.link).unwrap_or_else(|| feed_url.to_string()),
        articles,
        last_updated: now,
    }
}

/// `index` counts titled items only.
fn normalize_item(item: RawItem, index: usize, now: DateTime<Utc>) -> Article {
    let html = item
        .content
        .as_deref()
        .or(item.description.as_deref())
        .unwrap_or("");
    let content = clean_content(html);

    Article {
        id: non_empty(item.id).unwrap_or_else(|| format!("article-{}", index)),
        title: clean_text(item.title.as_deref().unwrap_or("")),
        description: clean_text(item.description.as_deref().unwrap_or("")),
        link: item.link.unwrap_or_default(),
        published_at: parse_date(item.published.as_deref(), now),
        author: cleaned_or(item.author.as_deref(), DEFAULT_AUTHOR),
        category: cleaned_or(item.category.as_deref(), DEFAULT_CATEGORY),
        image_url: non_empty(item.image).or_else(|| extract_image_url(html)),
        read_time: read_time(&content),
        excerpt: excerpt(&content, EXCERPT_LENGTH),
        content,
    }
}

// == Validate ==
/// Rejects feeds with untitled articles.
pub fn validate(feed: &FeedData) -> Result<(), FeedError> {
    match feed.articles.iter().position(|a| a.title.is_empty()) {
        Some(index) => Err(FeedError::Invalid(format!(
            "article {} has no title",
            index
        ))),
        None => Ok(()),
    }
}

// == Text Helpers ==

/// Strips scripts, styles and tags from HTML, collapsing whitespace.
pub fn clean_content(html: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(html, "");
    let text = STYLE_BLOCK.replace_all(&text, "");
    let text = TAG.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    decode_entities(text.trim())
}

/// Strips tags from a short field such as a title.
pub fn clean_text(text: &str) -> String {
    decode_entities(TAG.replace_all(text, "").trim())
}

/// Returns the `src` of the first `<img>` tag.
///
/// Within that tag the last `src=` wins, so `data-src` never shadows `src`.
pub fn extract_image_url(html: &str) -> Option<String> {
    IMG_SRC
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|src| src.as_str().to_string())
}

/// First words of `content`, with an ellipsis when truncated.
pub fn excerpt(content: &str, max_length: usize) -> String {
    let limit = max_length / 5;
    let words: Vec<&str> = content.split_whitespace().collect();
    if words.len() <= limit {
        return content.to_string();
    }
    format!("{}...", words[..limit].join(" "))
}

/// Estimated reading time in whole minutes, at least one.
pub fn read_time(content: &str) -> u32 {
    let words = content.split_whitespace().count().max(1);
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

/// Parses RFC 3339 or RFC 2822 dates, falling back to `now`.
pub fn parse_date(value: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return now;
    };

    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(now)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn cleaned_or(value: Option<&str>, fallback: &str) -> String {
    non_empty(value.map(clean_text)).unwrap_or_else(|| fallback.to_string())
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[0];
            ENTITIES
                .iter()
                .find(|(name, _)| *name == entity)
                .map_or(entity, |(_, decoded)| *decoded)
                .to_string()
        })
        .into_owned()
}

//! Feed document parsing
//!
//! Reads RSS 2.0 and Atom documents into the format-neutral `RawFeed`.
//! The document is first loaded into a small element tree, then fields are
//! picked out by their qualified names.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::model::{RawFeed, RawItem};
use crate::error::FeedError;

// == Parse Feed ==
/// Parses an RSS (`rss/channel`) or Atom (`feed`) document.
///
/// # Errors
/// `FeedError::Xml` for malformed XML, `FeedError::Invalid` when the root is
/// neither an RSS channel nor an Atom feed.
pub fn parse_feed(xml: &str) -> Result<RawFeed, FeedError> {
    let document = parse_tree(xml)?;

    if let Some(channel) = document.child("rss").and_then(|rss| rss.child("channel")) {
        return Ok(rss_channel(channel));
    }
    if let Some(feed) = document.child("feed") {
        return Ok(atom_feed(feed));
    }

    Err(FeedError::Invalid("Invalid RSS feed structure".to_string()))
}

// == RSS 2.0 ==

fn rss_channel(channel: &Element) -> RawFeed {
    RawFeed {
        title: channel.text_of("title"),
        description: channel.text_of("description"),
        link: channel.text_of("link"),
        items: channel.children("item").map(rss_item).collect(),
    }
}

fn rss_item(item: &Element) -> RawItem {
    RawItem {
        id: item.text_of("guid"),
        title: item.text_of("title"),
        link: item.text_of("link"),
        description: item.text_of("description"),
        content: item.text_of("content:encoded"),
        published: item.text_of("pubDate"),
        author: item.text_of("author").or_else(|| item.text_of("dc:creator")),
        category: item.children("category").find_map(Element::text_value),
        image: item
            .children("enclosure")
            .find(|e| e.attribute("type").is_some_and(is_image_type))
            .and_then(|e| e.attribute("url"))
            .map(str::to_string),
    }
}

// == Atom ==

fn atom_feed(feed: &Element) -> RawFeed {
    RawFeed {
        title: feed.text_of("title"),
        description: feed.text_of("subtitle"),
        link: atom_link(feed, "alternate"),
        items: feed.children("entry").map(atom_entry).collect(),
    }
}

fn atom_entry(entry: &Element) -> RawItem {
    RawItem {
        id: entry.text_of("id"),
        title: entry.text_of("title"),
        link: atom_link(entry, "alternate"),
        description: entry.text_of("summary"),
        content: entry.text_of("content"),
        published: entry
            .text_of("published")
            .or_else(|| entry.text_of("updated")),
        author: entry.child("author").and_then(|a| a.text_of("name")),
        category: entry.children("category").find_map(|c| {
            c.attribute("term")
                .map(str::to_string)
                .or_else(|| c.text_value())
        }),
        image: entry
            .children("link")
            .find(|l| {
                l.attribute("rel") == Some("enclosure")
                    && l.attribute("type").is_some_and(is_image_type)
            })
            .and_then(|l| l.attribute("href"))
            .map(str::to_string),
    }
}

/// `href` of the first link with `rel`; a link without `rel` is an alternate.
fn atom_link(element: &Element, rel: &str) -> Option<String> {
    element
        .children("link")
        .find(|l| l.attribute("rel").unwrap_or("alternate") == rel)
        .and_then(|l| l.attribute("href"))
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

fn is_image_type(mime: &str) -> bool {
    mime.starts_with("image/")
}

// == Element Tree ==

/// Just enough of an XML element to look fields up by name.
#[derive(Debug, Default)]
struct Element {
    /// Qualified name as written, e.g. `dc:creator`
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, FeedError> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            // HTML entities are not XML entities; keep such values raw
            let value = attribute
                .unescape_value()
                .map(Cow::into_owned)
                .unwrap_or_else(|_| String::from_utf8_lossy(&attribute.value).into_owned());
            attributes.push((key, value));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed text content, None when blank.
    fn text_value(&self) -> Option<String> {
        let text = self.text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Text of the first child named `name`.
    fn text_of(&self, name: &str) -> Option<String> {
        self.child(name).and_then(Element::text_value)
    }
}

fn parse_tree(xml: &str) -> Result<Element, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Bottom of the stack is the document itself
    let mut stack = vec![Element::default()];

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                append_child(&mut stack, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| FeedError::Invalid("unbalanced closing tag".to_string()))?;
                append_child(&mut stack, element)?;
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map(Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                append_text(&mut stack, &value);
            }
            Event::CData(data) => append_text(&mut stack, &String::from_utf8_lossy(&data)),
            Event::Eof => break,
            _ => {}
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(document), true) => Ok(document),
        _ => Err(FeedError::Invalid("unclosed element".to_string())),
    }
}

fn append_child(stack: &mut [Element], element: Element) -> Result<(), FeedError> {
    let parent = stack
        .last_mut()
        .ok_or_else(|| FeedError::Invalid("unbalanced closing tag".to_string()))?;
    parent.children.push(element);
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) {
    if let Some(current) = stack.last_mut() {
        current.text.push_str(text);
    }
}

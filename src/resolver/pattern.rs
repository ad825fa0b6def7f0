//! Pattern strategy: one regular expression over the raw page text.
//!
//! Captured attribute values are still HTML-escaped; they are decoded with the
//! same parser the markup strategy uses so both produce identical items.

use super::normalize_asset_url;
use crate::error::{Error, Result};
use crate::types::{Item, ItemId};
use regex::Regex;
use scraper::Html;
use url::Url;

/// Captures `src`, `title` and `alt` of the first image inside `div#comic`
const COMIC_IMAGE_PATTERN: &str =
    r#"(?s)<div id="comic">.*?<img src="(.*?)".*?title="(.*?)".*?alt="(.*?)".*?>"#;

/// Compiled extraction pattern
#[derive(Clone, Debug)]
pub struct PatternExtractor {
    regex: Regex,
}

impl PatternExtractor {
    /// Compile the extraction pattern
    pub fn new() -> Result<Self> {
        let regex = Regex::new(COMIC_IMAGE_PATTERN)
            .map_err(|e| Error::Other(format!("invalid extraction pattern: {}", e)))?;
        Ok(Self { regex })
    }

    /// Extract an item from raw page text
    pub fn parse(&self, id: ItemId, text: &str, page: &Url) -> Result<Item> {
        let captures = self
            .regex
            .captures(text)
            .ok_or_else(|| Error::NotFound(format!("item {}: comic pattern did not match", id)))?;

        let field = |i: usize| {
            decode_attribute(captures.get(i).map(|m| m.as_str()).unwrap_or_default())
        };

        Ok(Item {
            id,
            title: field(3),
            asset_url: normalize_asset_url(&field(1), page)?,
            alt_text: field(2),
        })
    }
}

/// Resolve character references (`&amp;`, `&quot;`, `&#39;`, ...) in a raw
/// double-quoted attribute value
fn decode_attribute(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let fragment = Html::parse_fragment(&format!(r#"<span title="{}"></span>"#, raw));
    fragment
        .root_element()
        .descendants()
        .filter_map(scraper::ElementRef::wrap)
        .find(|e| e.value().name() == "span")
        .and_then(|span| span.value().attr("title").map(str::to_string))
        .unwrap_or_else(|| raw.to_string())
}

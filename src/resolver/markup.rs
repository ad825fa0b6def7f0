//! Markup strategy: walk the page's element tree.
//!
//! Looks for the `div#comic` container anywhere in the document, then takes the
//! first `img` inside it, in document order. Comics with a large version wrap
//! the image in a link, so the image is not always a direct child. The image's `alt` attribute is the title and its
//! `title` attribute is the caption.

use super::normalize_asset_url;
use crate::error::{Error, Result};
use crate::types::{Item, ItemId};
use scraper::{ElementRef, Html};
use url::Url;

const CONTAINER_TAG: &str = "div";
const CONTAINER_ID: &str = "comic";

/// Page structure is untrusted; stop descending past this depth
const MAX_DEPTH: usize = 256;

/// Depth-first search for the container element
fn find_container(element: ElementRef<'_>, depth: usize) -> Option<ElementRef<'_>> {
    if depth > MAX_DEPTH {
        return None;
    }

    let value = element.value();
    if value.name() == CONTAINER_TAG && value.attr("id") == Some(CONTAINER_ID) {
        return Some(element);
    }

    element
        .children()
        .filter_map(ElementRef::wrap)
        .find_map(|child| find_container(child, depth + 1))
}

/// Depth-first search for the first image below `element`
fn find_image(element: ElementRef<'_>, depth: usize) -> Option<ElementRef<'_>> {
    if depth > MAX_DEPTH {
        return None;
    }

    element.children().filter_map(ElementRef::wrap).find_map(|child| {
        if child.value().name() == "img" {
            Some(child)
        } else {
            find_image(child, depth + 1)
        }
    })
}

/// Extract an item from a rendered page
pub fn parse(id: ItemId, html: &str, page: &Url) -> Result<Item> {
    let document = Html::parse_document(html);

    let container = find_container(document.root_element(), 0)
        .ok_or_else(|| Error::NotFound(format!("item {}: no comic container in page", id)))?;

    let image = find_image(container, 0)
        .ok_or_else(|| Error::NotFound(format!("item {}: no image in comic container", id)))?;

    let attrs = image.value();
    let src = attrs
        .attr("src")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::NotFound(format!("item {}: image has no src", id)))?;

    Ok(Item {
        id,
        title: attrs.attr("alt").unwrap_or_default().to_string(),
        asset_url: normalize_asset_url(src, page)?,
        alt_text: attrs.attr("title").unwrap_or_default().to_string(),
    })
}

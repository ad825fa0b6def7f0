//! Structured strategy: decode the JSON metadata record.

use super::normalize_asset_url;
use crate::error::{Error, Result};
use crate::types::{Item, ItemId};
use serde::Deserialize;
use url::Url;

/// Wire shape of the metadata record
#[derive(Debug, Deserialize)]
struct Record {
    num: u64,
    #[serde(default)]
    title: String,
    img: String,
    #[serde(default)]
    alt: String,
}

/// Parse a record body
///
/// When `expected` is set, a record for a different identifier is rejected.
pub fn parse(body: &str, url: &Url, expected: Option<ItemId>) -> Result<Item> {
    let record: Record = serde_json::from_str(body)
        .map_err(|e| Error::NotFound(format!("malformed record at {}: {}", url, e)))?;

    if record.num == 0 {
        return Err(Error::NotFound(format!("record at {} has no identifier", url)));
    }
    let id = ItemId(record.num);
    if let Some(expected) = expected
        && expected != id
    {
        return Err(Error::NotFound(format!(
            "record at {} is for item {}, expected {}",
            url, id, expected
        )));
    }

    Ok(Item {
        id,
        title: record.title,
        asset_url: normalize_asset_url(&record.img, url)?,
        alt_text: record.alt,
    })
}

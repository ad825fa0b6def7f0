//! Item resolution: identifier → [`Item`].
//!
//! Three interchangeable strategies derive the same [`Item`] shape:
//! - [`structured`] - decode the machine-readable JSON record
//! - [`markup`] - walk the rendered page's element tree
//! - [`pattern`] - run one regular expression over the rendered page text
//!
//! Callers only ever see [`Resolver::resolve`]; the configured [`Strategy`]
//! decides which extractor runs. Adding a strategy means adding a variant and
//! an extractor module, nothing in the dispatcher changes.

use crate::config::{Config, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::types::{Item, ItemId, Strategy};
use url::Url;

pub mod markup;
pub mod pattern;
pub mod structured;

/// Scheme prepended to protocol-relative asset URIs
const SECURE_SCHEME: &str = "https:";

/// Turn a raw `src` attribute or record field into a fully-qualified URI
///
/// Protocol-relative values (`//host/path`) get the secure scheme; absolute
/// URIs pass through; anything else is resolved against `page`.
pub fn normalize_asset_url(raw: &str, page: &Url) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::NotFound("empty asset locator".into()));
    }

    if raw.starts_with("//") {
        return Ok(format!("{}{}", SECURE_SCHEME, raw));
    }

    match Url::parse(raw) {
        Ok(url) => Ok(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => page
            .join(raw)
            .map(|u| u.to_string())
            .map_err(|e| Error::NotFound(format!("bad asset locator {:?}: {}", raw, e))),
        Err(e) => Err(Error::NotFound(format!(
            "bad asset locator {:?}: {}",
            raw, e
        ))),
    }
}

/// Resolves identifiers against the metadata source using one strategy
#[derive(Clone, Debug)]
pub struct Resolver {
    client: reqwest::Client,
    base_url: Url,
    strategy: Strategy,
    retry: RetryConfig,
    pattern: pattern::PatternExtractor,
}

impl Resolver {
    /// Create a resolver for `base_url`
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        strategy: Strategy,
        retry: RetryConfig,
    ) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::config("base_url", format!("{}: {}", base_url, e)))?;
        // Url::join treats a base without a trailing slash as a file, not a directory
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            strategy,
            retry,
            pattern: pattern::PatternExtractor::new()?,
        })
    }

    /// Create a resolver from the source and download sections of `config`
    pub fn from_config(client: reqwest::Client, config: &Config) -> Result<Self> {
        Self::new(
            client,
            &config.source.base_url,
            config.download.strategy,
            config.retry.clone(),
        )
    }

    /// Configured strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Resolve an identifier with the configured strategy
    pub async fn resolve(&self, id: ItemId) -> Result<Item> {
        self.resolve_with(id, self.strategy).await
    }

    /// Resolve an identifier with an explicit strategy
    pub async fn resolve_with(&self, id: ItemId, strategy: Strategy) -> Result<Item> {
        let item = match strategy {
            Strategy::Structured => {
                let url = self.join(&format!("{}/info.0.json", id))?;
                let body = self.fetch_text(&url, id).await?;
                structured::parse(&body, &url, Some(id))?
            }
            Strategy::Markup => {
                let url = self.page_url(id)?;
                let body = self.fetch_text(&url, id).await?;
                markup::parse(id, &body, &url)?
            }
            Strategy::Pattern => {
                let url = self.page_url(id)?;
                let body = self.fetch_text(&url, id).await?;
                self.pattern.parse(id, &body, &url)?
            }
        };

        tracing::debug!(
            item_id = id.0,
            strategy = %strategy,
            title = %item.title,
            asset = %item.asset_url,
            "Resolved item"
        );
        Ok(item)
    }

    /// Identifier of the newest item (the crawl's upper bound)
    ///
    /// Always uses the structured "latest" record regardless of strategy.
    pub async fn latest(&self) -> Result<ItemId> {
        let url = self.join("info.0.json")?;
        let body = self.fetch_text(&url, ItemId(0)).await?;
        let item = structured::parse(&body, &url, None)?;
        tracing::info!(latest = item.id.0, "Discovered latest item");
        Ok(item.id)
    }

    fn page_url(&self, id: ItemId) -> Result<Url> {
        self.join(&format!("{}/", id))
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Other(format!("cannot build URL for {}: {}", path, e)))
    }

    /// GET a URL and return its body; non-success responses are `NotFound`
    async fn fetch_text(&self, url: &Url, id: ItemId) -> Result<String> {
        with_retry(&self.retry, move || async move {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::NotFound(if id.0 == 0 {
                    format!("{} returned status {}", url, status)
                } else {
                    format!("item {} returned status {}", id, status)
                }));
            }
            Ok(response.text().await?)
        })
        .await
    }
}

//! Asset storage: naming, streaming writes, and directory reconciliation.
//!
//! Every stored item is a single file in one flat directory, named
//! `<id>-<sanitized title>.<ext>`. The `<id>-` prefix is the only durable key;
//! the startup scan in [`AssetStore::stored_ids`] relies on nothing else.
//!
//! Writes stream into a hidden `.<name>.part` sibling and are renamed into place
//! only after the body has been fully flushed, so a failed transfer never leaves
//! a truncated file that the next scan would mistake for a finished download.

use crate::error::{Error, Result};
use crate::types::{Item, ItemId};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Characters stripped from titles after spaces become underscores
const INVALID_TITLE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Image extensions kept from the asset URI; anything else is stored as png
const KNOWN_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];

/// Suffix of in-flight temporary files
const PARTIAL_SUFFIX: &str = ".part";

/// Byte budget for the sanitized title, leaving room for the prefix, the
/// extension and the `.part` wrapping inside a 255-byte filename limit
const MAX_TITLE_BYTES: usize = 200;

/// Make a title safe to embed in a filename
///
/// Spaces become underscores first, then path and shell metacharacters and
/// control characters (NUL included) are removed, then runs of underscores
/// left behind collapse to one. The result is cut to [`MAX_TITLE_BYTES`] on a
/// character boundary. `Hello /:*?"<>| World` becomes `Hello_World`.
pub fn sanitize_title(title: &str) -> String {
    let replaced = title.replace(' ', "_");
    let stripped = replaced
        .chars()
        .filter(|c| !INVALID_TITLE_CHARS.contains(c) && !c.is_control());

    let mut out = String::with_capacity(replaced.len().min(MAX_TITLE_BYTES));
    for c in stripped {
        if c == '_' && out.ends_with('_') {
            continue;
        }
        if out.len() + c.len_utf8() > MAX_TITLE_BYTES {
            break;
        }
        out.push(c);
    }
    out
}

/// File extension for an asset URI (lowercase, without the dot)
pub fn asset_extension(asset_url: &str) -> &'static str {
    let ext = url::Url::parse(asset_url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .and_then(|name| {
            Path::new(&name)
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
        });

    ext.and_then(|e| KNOWN_EXTENSIONS.iter().find(|k| **k == e).copied())
        .unwrap_or("png")
}

/// Deterministic destination filename for an item
pub fn asset_file_name(item: &Item) -> String {
    format!(
        "{}{}.{}",
        item.id.file_prefix(),
        sanitize_title(&item.title),
        asset_extension(&item.asset_url)
    )
}

/// Content type to serve a stored asset with
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Identifier encoded in a stored filename, if it carries a valid prefix
///
/// Only the canonical spelling counts (`7-`, never `007-` or `+7-`), so the
/// scan agrees with the literal prefix lookups in [`AssetStore::find_by_prefix`].
fn parse_prefix(file_name: &str) -> Option<ItemId> {
    let (digits, _) = file_name.split_once('-')?;
    if digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(ItemId(n)),
    }
}

/// Local asset directory plus the HTTP client used to fill it
#[derive(Clone, Debug)]
pub struct AssetStore {
    dir: PathBuf,
    client: reqwest::Client,
}

impl AssetStore {
    /// Create a store rooted at `dir` (the directory is not touched)
    pub fn new(dir: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            dir: dir.into(),
            client,
        }
    }

    /// Asset directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the asset directory if it does not exist
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| Error::Storage {
                path: self.dir.clone(),
                source,
            })
    }

    /// Fetch `locator` and write it to `destination` inside the asset directory
    ///
    /// The body is streamed chunk by chunk; it is never buffered whole.
    /// Returns the final path.
    pub async fn store(&self, locator: &str, destination: &str) -> Result<PathBuf> {
        if destination.is_empty()
            || destination.starts_with('.')
            || destination.contains(['/', '\\'])
        {
            return Err(Error::Storage {
                path: self.dir.join(destination),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "destination must be a plain file name",
                ),
            });
        }

        let response = self.client.get(locator).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::NotFound(format!(
                "asset {} returned status {}",
                locator, status
            )));
        }

        let final_path = self.dir.join(destination);
        let temp_path = self.dir.join(format!(".{}{}", destination, PARTIAL_SUFFIX));

        match Self::write_stream(response, &temp_path).await {
            Ok(bytes) => {
                tokio::fs::rename(&temp_path, &final_path)
                    .await
                    .map_err(|source| Error::Storage {
                        path: final_path.clone(),
                        source,
                    })?;
                tracing::debug!(path = %final_path.display(), bytes, "Stored asset");
                Ok(final_path)
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await
                    && cleanup.kind() != std::io::ErrorKind::NotFound
                {
                    tracing::warn!(
                        path = %temp_path.display(),
                        error = %cleanup,
                        "Failed to remove partial asset"
                    );
                }
                Err(e)
            }
        }
    }

    async fn write_stream(response: reqwest::Response, path: &Path) -> Result<u64> {
        let storage_err = |source| Error::Storage {
            path: path.to_path_buf(),
            source,
        };

        let mut file = tokio::fs::File::create(path).await.map_err(storage_err)?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(storage_err)?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(storage_err)?;
        file.sync_all().await.map_err(storage_err)?;
        Ok(written)
    }

    /// Path of the first stored asset whose name starts with `prefix`
    pub async fn find_by_prefix(&self, prefix: &str) -> Result<Option<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(prefix)
                && !name.ends_with(PARTIAL_SUFFIX)
                && entry.file_type().await?.is_file()
            {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }

    /// Whether an asset whose name starts with `prefix` is present
    pub async fn exists(&self, prefix: &str) -> Result<bool> {
        Ok(self.find_by_prefix(prefix).await?.is_some())
    }

    /// Stored asset for an item, if any
    pub async fn find(&self, id: ItemId) -> Result<Option<PathBuf>> {
        self.find_by_prefix(&id.file_prefix()).await
    }

    /// Identifiers of every asset in the directory
    pub async fn stored_ids(&self) -> Result<Vec<ItemId>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(id) = parse_prefix(&name.to_string_lossy()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// Delete `.part` files left behind by an interrupted run
    pub async fn remove_partials(&self) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX) {
                tokio::fs::remove_file(entry.path()).await?;
                tracing::info!(file = %name, "Removed partial asset from previous run");
                removed += 1;
            }
        }
        Ok(removed)
    }
}

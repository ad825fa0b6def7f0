//! The claim → resolve → store path.
//!
//! Batch workers and interactive tasks both end up here once they hold a claim.
//! Whatever happens, the claim is settled before returning: `complete` on
//! success or when the asset turns out to exist, `release` on any failure.

use crate::error::Error;
use crate::storage::asset_file_name;
use crate::types::{Event, ItemId};
use std::path::PathBuf;

use super::ComicDownloader;

/// Result of processing one claimed item
#[derive(Debug)]
pub enum ItemOutcome {
    /// Asset was fetched and written
    Stored(PathBuf),
    /// Asset was already on disk; nothing was fetched
    AlreadyStored,
    /// Resolution or storage failed; the claim was released
    Failed(Error),
}

impl ComicDownloader {
    /// Process an item whose claim the caller already holds
    pub(crate) async fn process_claimed(&self, id: ItemId) -> ItemOutcome {
        self.emit_event(Event::Claimed { id });

        let item = match self.resolver.resolve(id).await {
            Ok(item) => item,
            Err(e) => return self.fail(id, e, "Skipping item: resolution failed"),
        };

        match self.store.exists(&id.file_prefix()).await {
            Ok(true) => {
                // An asset on disk means done, same as the startup scan would conclude
                self.state.complete(id);
                tracing::info!(item_id = id.0, "Asset already exists, not re-downloading");
                self.emit_event(Event::AlreadyStored { id });
                return ItemOutcome::AlreadyStored;
            }
            Ok(false) => {}
            Err(e) => return self.fail(id, e, "Skipping item: storage lookup failed"),
        }

        let destination = asset_file_name(&item);
        match self.store.store(&item.asset_url, &destination).await {
            Ok(path) => {
                self.state.complete(id);
                tracing::info!(
                    item_id = id.0,
                    title = %item.title,
                    path = %path.display(),
                    "Asset saved"
                );
                self.emit_event(Event::Stored {
                    id,
                    path: path.clone(),
                });
                ItemOutcome::Stored(path)
            }
            Err(e) => self.fail(id, e, "Skipping item: download failed"),
        }
    }

    fn fail(&self, id: ItemId, error: Error, message: &'static str) -> ItemOutcome {
        self.state.release(id);
        tracing::warn!(item_id = id.0, error = %error, "{}", message);
        self.emit_event(Event::Failed {
            id,
            error: error.to_string(),
        });
        ItemOutcome::Failed(error)
    }

    /// Claim and process a single item in the caller's task
    ///
    /// Returns `None` when the claim is refused because the item is already in
    /// progress or done.
    pub async fn process_item(&self, id: ItemId) -> Option<ItemOutcome> {
        if !self.state.try_claim(id) {
            return None;
        }
        Some(self.process_claimed(id).await)
    }
}

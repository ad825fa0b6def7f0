//! Single-item requests from the HTTP front end.
//!
//! A request claims the item synchronously and hands it to a spawned task, so
//! the caller learns Accepted/Conflict immediately and never waits on the
//! network. Claims go through the same [`StateTracker`](crate::state::StateTracker)
//! as the batch workers.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use crate::error::{Error, Result};
use crate::types::{ItemId, ItemStatus};

use super::ComicDownloader;
use super::pipeline::ItemOutcome;

impl ComicDownloader {
    /// Current download status of an item
    pub fn item_status(&self, id: ItemId) -> ItemStatus {
        self.state.snapshot(id).into()
    }

    /// Claim an item and process it in the background
    ///
    /// Returns [`Error::Conflict`] if the item is already in progress or done,
    /// and [`Error::ShuttingDown`] once shutdown has begun. On `Ok` the
    /// background task owns the claim; an asset that turns out to exist is
    /// simply marked done.
    pub fn request_download(&self, id: ItemId) -> Result<()> {
        if !self.control.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        self.state
            .claim_or_state(id)
            .map_err(|state| Error::Conflict { id, state })?;

        tracing::info!(item_id = id.0, "Accepted download request");

        let downloader = self.clone();
        tokio::spawn(async move {
            match downloader.process_claimed(id).await {
                ItemOutcome::Stored(path) => {
                    tracing::debug!(item_id = id.0, path = %path.display(), "Requested item stored")
                }
                ItemOutcome::AlreadyStored => {
                    tracing::debug!(item_id = id.0, "Requested item was already stored")
                }
                ItemOutcome::Failed(e) => {
                    tracing::debug!(item_id = id.0, error = %e, "Requested item failed")
                }
            }
        });

        Ok(())
    }

    /// Path of an item's stored asset
    pub async fn asset_path(&self, id: ItemId) -> Result<PathBuf> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no stored asset for item {}", id)))
    }

    /// Stored asset bytes for an item
    pub async fn fetch_asset(&self, id: ItemId) -> Result<(PathBuf, Vec<u8>)> {
        let path = self.asset_path(id).await?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok((path, bytes)),
            // Removed between lookup and read
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(format!(
                "no stored asset for item {}",
                id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

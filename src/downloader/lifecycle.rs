//! Startup and shutdown coordination.

use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::error::Result;
use crate::types::Event;

use super::ComicDownloader;

/// How long shutdown waits for in-flight items before giving up
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval while waiting for in-flight items
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl ComicDownloader {
    /// Rebuild the state map from the asset directory
    ///
    /// Deletes `.part` leftovers from an interrupted run, then marks every
    /// identifier with a stored asset as done. Called by [`ComicDownloader::new`]
    /// before any worker can start. Returns the number of items marked.
    pub async fn rebuild_state(&self) -> Result<usize> {
        let removed = self.store.remove_partials().await?;
        if removed > 0 {
            tracing::info!(removed, "Cleaned up partial assets");
        }

        let stored = self.store.stored_ids().await?;
        Ok(self.state.rebuild_from_storage(stored))
    }

    /// Gracefully shut down the downloader
    ///
    /// 1. Stops accepting interactive requests
    /// 2. Fires the stop signal for any running batch crawl
    /// 3. Waits (up to 30 seconds) for claimed items to settle
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.control.accepting_new.store(false, Ordering::SeqCst);
        self.control.shutdown.cancel();

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_in_flight()).await {
            Ok(()) => tracing::info!("All in-flight items settled"),
            Err(_) => tracing::warn!(
                in_progress = self.state.in_progress_count(),
                "Timeout waiting for in-flight items, proceeding with shutdown"
            ),
        }

        self.emit_event(Event::Shutdown);
        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether shutdown has begun
    pub fn is_shutting_down(&self) -> bool {
        !self.control.accepting_new.load(Ordering::SeqCst)
    }

    async fn wait_for_in_flight(&self) {
        loop {
            let in_progress = self.state.in_progress_count();
            if in_progress == 0 {
                return;
            }
            tracing::debug!(in_progress, "Waiting for in-flight items");
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    }

    /// Spawn the HTTP API server in a background task
    pub fn spawn_api_server(&self) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = std::sync::Arc::new(self.clone());
        let config = self.get_config();
        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}

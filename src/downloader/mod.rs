//! Core downloader implementation split into focused submodules.
//!
//! The `ComicDownloader` struct and its methods are organized by concern:
//! - [`pipeline`] - The claim → resolve → store path shared by every producer
//! - [`dispatcher`] - Bounded worker pool for batch crawls and the stop signal
//! - [`interactive`] - Single-item requests, status queries, asset lookup
//! - [`lifecycle`] - Startup state rebuild and graceful shutdown

mod dispatcher;
mod interactive;
mod lifecycle;
mod pipeline;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use pipeline::ItemOutcome;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::resolver::Resolver;
use crate::state::StateTracker;
use crate::storage::AssetStore;
use crate::types::Event;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio_util::sync::CancellationToken;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Flags shared by every clone for coordinating shutdown
#[derive(Clone)]
pub(crate) struct ControlState {
    /// Cleared during shutdown; interactive requests are refused afterwards
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Parent of every batch stop token; cancelling it halts all crawls
    pub(crate) shutdown: CancellationToken,
}

impl ControlState {
    fn new() -> Self {
        Self {
            accepting_new: Arc::new(AtomicBool::new(true)),
            shutdown: CancellationToken::new(),
        }
    }
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
///
/// Batch crawls and interactive requests share one [`StateTracker`] and one
/// [`AssetStore`], so a given item is processed by at most one of them at a time.
#[derive(Clone)]
pub struct ComicDownloader {
    /// Configuration
    pub(crate) config: Arc<Config>,
    /// Per-item download state (sole owner of the state map)
    pub(crate) state: Arc<StateTracker>,
    /// Identifier → item resolution
    pub(crate) resolver: Arc<Resolver>,
    /// Asset directory
    pub(crate) store: Arc<AssetStore>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Shutdown coordination
    pub(crate) control: ControlState,
}

/// Build the shared HTTP client with the configured timeout and user agent
pub(crate) fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.source.request_timeout)
        .connect_timeout(config.source.request_timeout)
        .user_agent(config.source.user_agent.clone())
        .build()
        .map_err(Error::Transport)
}

impl ComicDownloader {
    /// Create a new ComicDownloader instance
    ///
    /// This validates the configuration, creates the asset directory, and
    /// rebuilds the in-memory state from the files already on disk. Any failure
    /// here is fatal: nothing has been downloaded yet and no worker is running.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let client = build_http_client(&config)?;
        let resolver = Resolver::from_config(client.clone(), &config)?;
        let store = AssetStore::new(config.download.download_dir.clone(), client);
        store.ensure_dir().await?;

        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let downloader = Self {
            config: Arc::new(config),
            state: Arc::new(StateTracker::new()),
            resolver: Arc::new(resolver),
            store: Arc::new(store),
            event_tx,
            control: ControlState::new(),
        };

        downloader.rebuild_state().await?;

        tracing::info!(
            download_dir = %downloader.store.dir().display(),
            strategy = %downloader.resolver.strategy(),
            workers = downloader.config.download.max_concurrent_downloads,
            "Downloader initialized"
        );

        Ok(downloader)
    }

    /// Subscribe to download events
    ///
    /// Each subscriber receives all events independently. A subscriber that
    /// falls more than 1000 events behind receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Shared state tracker
    pub fn state(&self) -> &StateTracker {
        &self.state
    }

    /// Shared asset store
    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Configured resolver
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Emit an event to all subscribers (dropped silently when nobody listens)
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

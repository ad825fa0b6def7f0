//! # comic-dl
//!
//! Concurrent downloader for numbered web comics.
//!
//! ## Overview
//!
//! - **Resolver** turns an item number into an [`Item`] using one of three
//!   interchangeable strategies (structured record, markup walk, text pattern)
//! - **AssetStore** streams image bytes into a flat directory with atomic renames
//! - **StateTracker** is the exactly-once gate shared by every producer
//! - **ComicDownloader** runs batch crawls over a worker pool and serves
//!   interactive single-item requests through the REST API
//!
//! ## Quick Start
//!
//! ```no_run
//! use comic_dl::{ComicDownloader, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = ComicDownloader::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = downloader.run_batch().await?;
//!     println!("stored {} new comics", summary.stored);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Item resolution strategies
pub mod resolver;
/// Retry logic with exponential backoff
pub mod retry;
/// Per-item download state
pub mod state;
/// Asset directory
pub mod storage;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, DownloadConfig, RetryConfig, SourceConfig};
pub use downloader::{ComicDownloader, ItemOutcome};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use resolver::Resolver;
pub use state::StateTracker;
pub use storage::AssetStore;
pub use types::{
    BatchSummary, DownloadState, Event, ExistingPolicy, Item, ItemId, ItemStatus, SkipReason,
    Strategy,
};

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use comic_dl::{ComicDownloader, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let downloader = ComicDownloader::new(config).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: ComicDownloader) -> Result<()> {
    shutdown_signal().await;
    downloader.shutdown().await
}

/// Resolve once SIGTERM or SIGINT (Ctrl+C on non-Unix) arrives
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Resolve once Ctrl+C arrives
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}

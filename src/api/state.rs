//! Application state for the API server

use crate::{ComicDownloader, Config};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The downloader shared with any batch crawl
    pub downloader: Arc<ComicDownloader>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(downloader: Arc<ComicDownloader>, config: Arc<Config>) -> Self {
        Self { downloader, config }
    }
}

//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`items`] - Item status, download requests, stored assets
//! - [`system`] - Health, events, OpenAPI

use serde::{Deserialize, Serialize};

mod items;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use items::*;
pub use system::*;

/// Response body for POST /item/:id
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AcceptedResponse {
    /// Item the background task was started for
    pub id: crate::types::ItemId,
    /// Always "accepted"
    pub status: String,
}

//! Error types for comic-dl
//!
//! This module provides the error taxonomy for the library, including:
//! - Per-item failures (transport, not found, storage) that never abort a crawl
//! - Startup failures (configuration, unknown strategy) that stop the process
//! - HTTP status code mapping and machine-readable error bodies for the API

use crate::types::{DownloadState, ItemId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for comic-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for comic-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// Unknown extraction strategy name
    #[error("invalid extraction strategy: {0}")]
    InvalidStrategy(String),

    /// Network failure or timeout talking to the metadata source or asset host
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Resource absent, non-success response, or unparsable record/markup
    #[error("not found: {0}")]
    NotFound(String),

    /// Writing an asset to local storage failed
    #[error("storage error at {}: {source}", path.display())]
    Storage {
        /// Destination (or temporary) path that could not be written
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// Item is already claimed or already downloaded
    #[error("item {id} is already {state}")]
    Conflict {
        /// The item whose claim was rejected
        id: ItemId,
        /// The state that blocked the claim
        state: DownloadState,
    },

    /// Identifier supplied by a caller is not a positive integer
    #[error("invalid item id: {0:?}")]
    InvalidId(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new requests
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "conflict",
///     "message": "item 42 is already in_progress",
///     "details": { "item_id": 42, "state": "in_progress" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::InvalidId(_) => 400,
            Error::InvalidStrategy(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 409 Conflict
            Error::Conflict { .. } => 409,

            // 500 Internal Server Error
            Error::Config { .. } => 500,
            Error::Storage { .. } => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - upstream source failed
            Error::Transport(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidStrategy(_) => "invalid_strategy",
            Error::Transport(_) => "transport_error",
            Error::NotFound(_) => "not_found",
            Error::Storage { .. } => "storage_error",
            Error::Conflict { .. } => "conflict",
            Error::InvalidId(_) => "validation_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Conflict { id, state } => Some(serde_json::json!({
                "item_id": id,
                "state": state,
            })),
            Error::InvalidId(raw) => Some(serde_json::json!({
                "value": raw,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

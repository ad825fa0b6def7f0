//! Item handlers: status, download requests, stored assets.
//!
//! Path identifiers are taken as strings and parsed here so a non-numeric id
//! becomes a 400 with the usual JSON error body instead of axum's plain-text
//! rejection.

use super::AcceptedResponse;
use crate::api::AppState;
use crate::error::Result;
use crate::storage::content_type_for;
use crate::types::ItemId;
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// GET /item/:id - Download status of one item
#[utoipa::path(
    get,
    path = "/item/{id}",
    tag = "items",
    params(
        ("id" = u64, Path, description = "Item identifier")
    ),
    responses(
        (status = 200, description = "Current status", body = crate::types::ItemStatus),
        (status = 400, description = "Identifier is not a positive integer", body = crate::error::ApiError)
    )
)]
pub async fn get_item_status(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response> {
    let id: ItemId = raw.parse()?;
    let status = state.downloader.item_status(id);
    Ok((StatusCode::OK, Json(status)).into_response())
}

/// POST /item/:id - Start downloading one item in the background
#[utoipa::path(
    post,
    path = "/item/{id}",
    tag = "items",
    params(
        ("id" = u64, Path, description = "Item identifier")
    ),
    responses(
        (status = 202, description = "Claimed; processing continues in the background", body = AcceptedResponse),
        (status = 400, description = "Identifier is not a positive integer", body = crate::error::ApiError),
        (status = 409, description = "Item already in progress or done", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn request_item_download(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response> {
    let id: ItemId = raw.parse()?;
    state.downloader.request_download(id)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            id,
            status: "accepted".to_string(),
        }),
    )
        .into_response())
}

/// GET /download/:id - Stored asset bytes
#[utoipa::path(
    get,
    path = "/download/{id}",
    tag = "items",
    params(
        ("id" = u64, Path, description = "Item identifier")
    ),
    responses(
        (status = 200, description = "Asset bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Identifier is not a positive integer", body = crate::error::ApiError),
        (status = 404, description = "No stored asset for this item", body = crate::error::ApiError)
    )
)]
pub async fn download_asset(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response> {
    let id: ItemId = raw.parse()?;
    let (path, bytes) = state.downloader.fetch_asset(id).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&path).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

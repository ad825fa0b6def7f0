//! OpenAPI documentation and schema generation
//!
//! Uses utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the comic-dl REST API
///
/// Served at `/openapi.json` and browsable at `/swagger-ui` when enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "comic-dl REST API",
        version = "0.2.0",
        description = "Per-item status, on-demand downloads, and stored asset retrieval for comic-dl",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6789", description = "Local development server")
    ),
    paths(
        // Items
        crate::api::routes::get_item_status,
        crate::api::routes::request_item_download,
        crate::api::routes::download_asset,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::ItemId,
        crate::types::Item,
        crate::types::ItemStatus,
        crate::types::DownloadState,
        crate::types::Strategy,
        crate::types::ExistingPolicy,
        crate::types::SkipReason,
        crate::types::Event,
        crate::types::BatchSummary,
        crate::api::routes::AcceptedResponse,
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "items", description = "Item status, download requests, and stored assets"),
        (name = "system", description = "Health, OpenAPI specification, and event stream")
    )
)]
pub struct ApiDoc;

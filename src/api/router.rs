//! Application router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Every response carries `Cache-Control: no-store`: CV contents must not
//! linger in browser or proxy caches.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::types::AppState;

/// Slack on top of the file limit for multipart framing and headers.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn app_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(endpoints::page::index))
        .route("/health", get(endpoints::health::check))
        .route("/api/extract", post(endpoints::extract::extract))
        .route("/api/docx", post(endpoints::download::docx))
        .route("/api/convert", post(endpoints::download::convert))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub ocr_languages: String,
    pub accepted_types: [&'static str; 3],
}

/// `GET /health`: liveness and build info.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        ocr_languages: state.ocr_languages.clone(),
        accepted_types: crate::config::ACCEPTED_MIME_TYPES,
    })
}

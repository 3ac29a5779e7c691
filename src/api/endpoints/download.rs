//! Word document downloads.
//!
//! `POST /api/docx` renders text the client already has (the reviewed text
//! area). `POST /api/convert` does upload → extract → render in one request.
//! Either way the archive is built in memory and written straight into the
//! response body.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::extract::{read_upload, run_extraction};
use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::config::{DOCX_MIME, DOWNLOAD_FILE_NAME};
use crate::pipeline::export::render_docx;
use crate::pipeline::processor::ProcessingError;

#[derive(Debug, Deserialize)]
pub struct DocxRequest {
    pub text: String,
}

pub async fn docx(
    payload: Result<Json<DocxRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    if request.text.trim().is_empty() {
        return Err(ApiError::NoText);
    }

    let bytes = render_blocking(request.text).await?;
    Ok(docx_response(bytes))
}

pub async fn convert(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    let processed = run_extraction(&state, upload).await?;

    let bytes = render_blocking(processed.extracted.text).await?;
    Ok(docx_response(bytes))
}

async fn render_blocking(text: String) -> Result<Vec<u8>, ApiError> {
    let bytes = tokio::task::spawn_blocking(move || render_docx(&text))
        .await?
        .map_err(ProcessingError::from)?;
    Ok(bytes)
}

/// Attachment response carrying the packed .docx.
pub fn docx_response(bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

//! `POST /api/extract`: multipart upload → extracted text as JSON.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::pipeline::extraction::types::{DocumentKind, PageContent};
use crate::pipeline::processor::{process_upload, ProcessedUpload, UploadedFile};

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub file_name: String,
    pub mime_type: String,
    pub kind: DocumentKind,
    pub text: String,
    pub pages: Vec<PageSummary>,
}

#[derive(Debug, Serialize)]
pub struct PageSummary {
    pub page_number: usize,
    /// `direct_text` or `ocr_text`.
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub chars: usize,
}

impl From<ProcessedUpload> for ExtractResponse {
    fn from(processed: ProcessedUpload) -> Self {
        let pages = processed
            .extracted
            .pages
            .iter()
            .map(|page| {
                let (method, confidence) = match &page.content {
                    PageContent::DirectText { .. } => ("direct_text", None),
                    PageContent::OcrText { confidence, .. } => ("ocr_text", Some(*confidence)),
                };
                PageSummary {
                    page_number: page.page_number,
                    method,
                    confidence,
                    chars: page.content.text().chars().count(),
                }
            })
            .collect();

        Self {
            file_name: processed.file_name,
            mime_type: processed.format.mime_type,
            kind: processed.extracted.kind,
            text: processed.extracted.text,
            pages,
        }
    }
}

pub async fn extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    let processed = run_extraction(&state, upload).await?;
    Ok(Json(processed.into()))
}

/// Pull the `file` field out of a multipart body. Other fields are ignored.
pub(crate) async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let declared_mime = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        tracing::debug!(
            file_name = %file_name,
            declared = ?declared_mime,
            size = bytes.len(),
            "Upload received"
        );

        let mut upload = UploadedFile::new(file_name, bytes.to_vec());
        if let Some(mime) = declared_mime {
            upload = upload.with_declared_mime(mime);
        }
        return Ok(upload);
    }

    Err(ApiError::BadRequest("No file provided".into()))
}

/// Run the blocking pipeline off the async runtime.
pub(crate) async fn run_extraction(
    state: &AppState,
    upload: UploadedFile,
) -> Result<ProcessedUpload, ApiError> {
    let extractor = state.extractor.clone();
    let work_root = state.work_root.clone();
    let max_bytes = state.max_upload_bytes;

    let processed = tokio::task::spawn_blocking(move || {
        process_upload(extractor.as_ref(), &work_root, &upload, max_bytes)
    })
    .await??;

    Ok(processed)
}

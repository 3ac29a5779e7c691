//! API error types with structured JSON responses.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::extraction::FailureKind;
use crate::pipeline::import::ImportError;
use crate::pipeline::processor::ProcessingError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Document could not be read: {0}")]
    DocumentRead(String),
    #[error("OCR failed: {0}")]
    Ocr(String),
    #[error("No text could be extracted from the file")]
    NoText,
    #[error("Document generation failed: {0}")]
    DocumentWrite(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::PayloadTooLarge(detail) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                detail.clone(),
            ),
            ApiError::UnsupportedMediaType(detail) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                detail.clone(),
            ),
            ApiError::DocumentRead(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "DOCUMENT_READ",
                format!("Error reading the document: {detail}"),
            ),
            ApiError::Ocr(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "OCR_FAILED",
                format!("Error during OCR: {detail}"),
            ),
            ApiError::NoText => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_TEXT",
                "No text could be extracted from the file".to_string(),
            ),
            ApiError::DocumentWrite(detail) => {
                tracing::error!(detail, "Word document generation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DOCUMENT_WRITE",
                    "Error creating the Word document".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ProcessingError> for ApiError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Import(e) => match &e {
                ImportError::UnsupportedFormat(_) => ApiError::UnsupportedMediaType(e.to_string()),
                ImportError::FileTooLarge { .. } => ApiError::PayloadTooLarge(e.to_string()),
                ImportError::EmptyUpload => ApiError::BadRequest(e.to_string()),
                ImportError::Io(io) => ApiError::Internal(format!("staging failed: {io}")),
            },
            ProcessingError::Extraction(e) => match e.kind() {
                FailureKind::DocumentRead => ApiError::DocumentRead(e.to_string()),
                FailureKind::Ocr => ApiError::Ocr(e.to_string()),
            },
            ProcessingError::Export(e) => ApiError::DocumentWrite(e.to_string()),
            ProcessingError::NoText => ApiError::NoText,
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("Upload exceeds the size limit".into())
        } else {
            ApiError::BadRequest(format!("Malformed upload: {}", err.body_text()))
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("Request body exceeds the size limit".into())
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("worker task failed: {err}"))
    }
}

//! Shared state for the HTTP layer.

use std::path::PathBuf;
use std::sync::Arc;

use crate::pipeline::extraction::types::TextExtractor;

/// Shared context for all routes. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<dyn TextExtractor + Send + Sync>,
    /// Parent directory for request workspaces.
    pub work_root: PathBuf,
    pub ocr_languages: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        extractor: Arc<dyn TextExtractor + Send + Sync>,
        work_root: PathBuf,
        ocr_languages: impl Into<String>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            extractor,
            work_root,
            ocr_languages: ocr_languages.into(),
            max_upload_bytes,
        }
    }
}

//! Upload processing: stage → detect → extract, inside a request workspace.
//!
//! Blocking. Callers on the async side run it through `spawn_blocking`.

use std::path::Path;

use serde::Serialize;

use crate::pipeline::export::ExportError;
use crate::pipeline::extraction::types::{ExtractedText, TextExtractor};
use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::import::format::{
    detect_format, guess_mime_from_name, sanitize_filename, validate_upload, FormatDetection,
};
use crate::pipeline::import::staging::RequestWorkspace;
use crate::pipeline::import::ImportError;

/// Errors that can occur while turning an upload into text or a document.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("No text could be extracted from the file")]
    NoText,
}

/// A file received from the client, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    /// Content type sent with the upload, if any.
    pub declared_mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            declared_mime: None,
            bytes,
        }
    }

    pub fn with_declared_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }

    /// Declared type, falling back to a guess from the file extension.
    fn effective_declared_mime(&self) -> Option<String> {
        self.declared_mime
            .clone()
            .filter(|m| !m.trim().is_empty() && m != "application/octet-stream")
            .or_else(|| guess_mime_from_name(&self.file_name))
    }
}

/// Outcome of a successful extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedUpload {
    pub file_name: String,
    pub format: FormatDetection,
    pub extracted: ExtractedText,
}

/// Extract the text of one upload.
///
/// The upload is staged in a fresh workspace under `work_root`; that
/// workspace is gone by the time this returns, on success or failure.
pub fn process_upload(
    extractor: &dyn TextExtractor,
    work_root: &Path,
    upload: &UploadedFile,
    max_upload_bytes: usize,
) -> Result<ProcessedUpload, ProcessingError> {
    let file_name = sanitize_filename(&upload.file_name);
    let declared = upload.effective_declared_mime();
    let format = detect_format(&upload.bytes, declared.as_deref());
    validate_upload(&format, max_upload_bytes)?;

    tracing::info!(
        file_name = %file_name,
        mime_type = %format.mime_type,
        category = format.category.as_str(),
        size = format.file_size_bytes,
        "Processing upload"
    );

    let workspace = RequestWorkspace::create(work_root)?;
    let staged_path = workspace.stage(&file_name, &upload.bytes)?;

    let extracted = extractor.extract_file(&staged_path, &format)?;

    if let Err(e) = workspace.close() {
        tracing::warn!(error = %e, "Failed to remove request workspace");
    }

    // Whitespace-only output (e.g. OCR of blank scans) counts as nothing found
    if extracted.text.trim().is_empty() {
        return Err(ProcessingError::NoText);
    }

    Ok(ProcessedUpload {
        file_name,
        format,
        extracted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::ocr::MockOcrEngine;
    use crate::pipeline::extraction::orchestrator::DocumentExtractor;
    use crate::pipeline::extraction::pdf::PdfTextExtractor;
    use crate::pipeline::extraction::pdfium::MockPdfPageRenderer;
    use crate::pipeline::extraction::test_support::{jpeg_bytes, make_pdf, png_bytes, TestPage};
    use crate::pipeline::extraction::types::DocumentKind;
    use crate::pipeline::import::format::FileCategory;

    const MAX: usize = 10 * 1024 * 1024;

    fn extractor(ocr: MockOcrEngine) -> DocumentExtractor {
        DocumentExtractor::new(
            Box::new(ocr),
            Box::new(PdfTextExtractor),
            Box::new(MockPdfPageRenderer::new(16)),
        )
    }

    fn assert_root_empty(root: &Path) {
        let left: Vec<_> = std::fs::read_dir(root).unwrap().collect();
        assert!(left.is_empty(), "work root not cleaned up: {left:?}");
    }

    #[test]
    fn digital_pdf_extracts_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let pdf = make_pdf(&[TestPage::Text("Nguyen Van A"), TestPage::Text("Rust Engineer")]);
        let upload = UploadedFile::new("cv.pdf", pdf).with_declared_mime("application/pdf");

        let processed =
            process_upload(&extractor(MockOcrEngine::new("unused", 0.9)), root.path(), &upload, MAX)
                .unwrap();

        assert_eq!(processed.file_name, "cv.pdf");
        assert_eq!(processed.format.category, FileCategory::Pdf);
        assert_eq!(processed.extracted.kind, DocumentKind::Pdf);
        assert!(processed.extracted.text.contains("Nguyen Van A"));
        assert!(processed.extracted.text.contains("Rust Engineer"));
        assert!(processed.extracted.text.ends_with('\n'));
        assert_root_empty(root.path());
    }

    #[test]
    fn scanned_page_uses_ocr() {
        let root = tempfile::tempdir().unwrap();
        let pdf = make_pdf(&[TestPage::Text("Hello"), TestPage::Image]);
        let upload = UploadedFile::new("scan.pdf", pdf);

        let processed =
            process_upload(&extractor(MockOcrEngine::new("World", 0.8)), root.path(), &upload, MAX)
                .unwrap();

        assert!(processed.extracted.text.ends_with("World\n"));
        assert_eq!(processed.extracted.ocr_page_count(), 1);
        assert_root_empty(root.path());
    }

    #[test]
    fn png_and_jpeg_are_ocred_verbatim() {
        let root = tempfile::tempdir().unwrap();
        let ex = extractor(MockOcrEngine::new("Tran Thi B", 0.9));

        for (name, bytes) in [("cv.png", png_bytes()), ("cv.jpg", jpeg_bytes())] {
            let processed =
                process_upload(&ex, root.path(), &UploadedFile::new(name, bytes), MAX).unwrap();
            assert_eq!(processed.extracted.text, "Tran Thi B");
            assert_eq!(processed.format.category, FileCategory::Image);
        }
        assert_root_empty(root.path());
    }

    #[test]
    fn corrupt_pdf_fails_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let upload = UploadedFile::new("broken.pdf", b"%PDF-1.4\nnot really a pdf".to_vec());

        let err = process_upload(&extractor(MockOcrEngine::new("x", 0.9)), root.path(), &upload, MAX)
            .unwrap_err();

        assert!(matches!(err, ProcessingError::Extraction(_)));
        assert_root_empty(root.path());
    }

    #[test]
    fn ocr_failure_fails_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let upload = UploadedFile::new("cv.png", png_bytes());

        let err = process_upload(&extractor(MockOcrEngine::failing()), root.path(), &upload, MAX)
            .unwrap_err();

        assert!(matches!(
            err,
            ProcessingError::Extraction(ExtractionError::OcrProcessing(_))
        ));
        assert_root_empty(root.path());
    }

    #[test]
    fn unsupported_type_rejected() {
        let root = tempfile::tempdir().unwrap();
        let upload = UploadedFile::new("cv.docx", b"PK\x03\x04....".to_vec());

        let err = process_upload(&extractor(MockOcrEngine::new("x", 0.9)), root.path(), &upload, MAX)
            .unwrap_err();

        assert!(matches!(
            err,
            ProcessingError::Import(ImportError::UnsupportedFormat(_))
        ));
        assert_root_empty(root.path());
    }

    #[test]
    fn oversized_upload_rejected() {
        let root = tempfile::tempdir().unwrap();
        let upload = UploadedFile::new("cv.png", png_bytes());

        let err = process_upload(&extractor(MockOcrEngine::new("x", 0.9)), root.path(), &upload, 16)
            .unwrap_err();

        assert!(matches!(err, ProcessingError::Import(ImportError::FileTooLarge { .. })));
        assert_root_empty(root.path());
    }

    #[test]
    fn rejected_upload_is_never_written() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("work");
        let ext = extractor(MockOcrEngine::new("x", 0.9));

        let empty = UploadedFile::new("cv.pdf", Vec::new());
        let unsupported = UploadedFile::new("cv.docx", b"PK\x03\x04....".to_vec());
        let oversized = UploadedFile::new("cv.png", png_bytes());

        assert!(process_upload(&ext, &root, &empty, MAX).is_err());
        assert!(process_upload(&ext, &root, &unsupported, MAX).is_err());
        assert!(process_upload(&ext, &root, &oversized, 16).is_err());
        assert!(!root.exists());
    }

    #[test]
    fn blank_result_is_no_text() {
        let root = tempfile::tempdir().unwrap();
        let pdf = make_pdf(&[TestPage::Image, TestPage::Blank]);
        let upload = UploadedFile::new("blank.pdf", pdf);

        let err = process_upload(&extractor(MockOcrEngine::new("", 0.0)), root.path(), &upload, MAX)
            .unwrap_err();

        assert!(matches!(err, ProcessingError::NoText));
        assert_eq!(err.to_string(), "No text could be extracted from the file");
        assert_root_empty(root.path());
    }

    #[test]
    fn file_name_is_sanitized() {
        let root = tempfile::tempdir().unwrap();
        let upload = UploadedFile::new("../../etc/cv.png", png_bytes());

        let processed =
            process_upload(&extractor(MockOcrEngine::new("text", 0.9)), root.path(), &upload, MAX)
                .unwrap();

        assert_eq!(processed.file_name, "cv.png");
    }

    #[test]
    fn declared_mime_falls_back_to_extension() {
        let upload = UploadedFile::new("cv.pdf", vec![]);
        assert_eq!(upload.effective_declared_mime().as_deref(), Some("application/pdf"));

        let upload = UploadedFile::new("cv.pdf", vec![]).with_declared_mime("application/octet-stream");
        assert_eq!(upload.effective_declared_mime().as_deref(), Some("application/pdf"));

        let upload = UploadedFile::new("cv", vec![]).with_declared_mime("image/png");
        assert_eq!(upload.effective_declared_mime().as_deref(), Some("image/png"));
    }
}

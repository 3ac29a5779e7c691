use std::panic::{catch_unwind, AssertUnwindSafe};

use super::types::{PageText, PdfExtractor};
use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers; image-only pages come back empty.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
        // pdf-extract panics on some malformed inputs instead of returning Err.
        let page_texts = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        }))
        .map_err(|_| ExtractionError::PdfParsing("PDF structure could not be decoded".into()))?
        .map_err(map_output_error)?;

        tracing::debug!(pages = page_texts.len(), "Direct text extraction finished");

        Ok(page_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PageText {
                page_number: i + 1,
                text,
            })
            .collect())
    }
}

/// Detect encrypted PDFs for user-friendly messaging.
fn map_output_error(e: pdf_extract::OutputError) -> ExtractionError {
    let msg = e.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        ExtractionError::PdfEncrypted
    } else {
        ExtractionError::PdfParsing(msg)
    }
}

pub mod types;
pub mod pdf;
pub mod ocr;
pub mod pdfium;
pub mod pdf_renderer;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_support;

pub use types::*;
pub use pdf::*;
pub use ocr::*;
pub use orchestrator::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tesseract OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("Tessdata for '{lang}' not found in {dir}")]
    TessdataNotFound { dir: PathBuf, lang: String },

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF is password-protected, please remove the password first")]
    PdfEncrypted,

    #[error("Failed to render page {page}: {reason}")]
    PdfRendering { page: usize, reason: String },

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Unsupported format for extraction")]
    UnsupportedFormat,
}

/// Which stage of the pipeline a failure belongs to, as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The source document could not be read, parsed or rasterized.
    DocumentRead,
    /// The OCR engine failed to start or to recognize the image.
    Ocr,
}

impl ExtractionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::OcrInit(_) | Self::OcrProcessing(_) | Self::TessdataNotFound { .. } => {
                FailureKind::Ocr
            }
            Self::Io(_)
            | Self::PdfParsing(_)
            | Self::PdfEncrypted
            | Self::PdfRendering { .. }
            | Self::ImageProcessing(_)
            | Self::UnsupportedFormat => FailureKind::DocumentRead,
        }
    }
}

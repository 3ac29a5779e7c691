use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ExtractionError;
use crate::pipeline::import::format::{FileCategory, FormatDetection};

/// A staged upload, loaded and ready for extraction.
#[derive(Debug, Clone)]
pub enum SourceDocument {
    /// PDF: an ordered sequence of pages.
    Paged(Vec<u8>),
    /// A single PNG or JPEG image.
    Raster(Vec<u8>),
}

impl SourceDocument {
    /// Read a staged file from disk, choosing the variant from its detected format.
    pub fn load(path: &Path, format: &FormatDetection) -> Result<Self, ExtractionError> {
        match format.category {
            FileCategory::Pdf => Ok(Self::Paged(std::fs::read(path)?)),
            FileCategory::Image => Ok(Self::Raster(std::fs::read(path)?)),
            FileCategory::Unsupported => Err(ExtractionError::UnsupportedFormat),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Paged(_) => DocumentKind::Pdf,
            Self::Raster(_) => DocumentKind::Image,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Image,
}

/// Where a page's text came from. Resolved once per page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PageContent {
    /// Text embedded in the PDF structure.
    DirectText { text: String },
    /// Text recognized from the rendered page or image.
    OcrText { text: String, confidence: f32 },
}

impl PageContent {
    pub fn text(&self) -> &str {
        match self {
            Self::DirectText { text } | Self::OcrText { text, .. } => text,
        }
    }

    pub fn is_ocr(&self) -> bool {
        matches!(self, Self::OcrText { .. })
    }
}

/// Per-page extraction result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageExtraction {
    /// 1-based, in document order.
    pub page_number: usize,
    pub content: PageContent,
}

/// Result of text extraction from a single document.
///
/// `text` is the final flat string handed to the caller; `pages` records how
/// each segment was obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub kind: DocumentKind,
    pub text: String,
    pub pages: Vec<PageExtraction>,
}

impl ExtractedText {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn ocr_page_count(&self) -> usize {
        self.pages.iter().filter(|p| p.content.is_ocr()).count()
    }
}

/// Directly extracted text of one PDF page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

/// Raw OCR result from the engine
#[derive(Debug)]
pub struct OcrPageResult {
    pub text: String,
    pub confidence: f32,
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError>;

    /// Tesseract language string in use, e.g. "eng+vie".
    fn languages(&self) -> &str;
}

/// PDF text extraction abstraction
pub trait PdfExtractor {
    /// Embedded text of every page, in page order.
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError>;
}

/// Renders a single PDF page to PNG bytes for OCR.
pub trait PdfPageRenderer {
    /// `page_index` is 0-based.
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError>;
}

/// Main extraction trait
pub trait TextExtractor {
    fn extract(&self, document: &SourceDocument) -> Result<ExtractedText, ExtractionError>;

    /// Load a staged file and extract it.
    fn extract_file(
        &self,
        path: &Path,
        format: &FormatDetection,
    ) -> Result<ExtractedText, ExtractionError> {
        let document = SourceDocument::load(path, format)?;
        self.extract(&document)
    }
}

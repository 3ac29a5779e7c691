use super::types::{
    DocumentKind, ExtractedText, OcrEngine, PageContent, PageExtraction, PdfExtractor,
    PdfPageRenderer, SourceDocument, TextExtractor,
};
use super::ExtractionError;
use crate::config::DEFAULT_RENDER_DPI;

/// Concrete implementation of the text extractor.
/// Uses trait objects for OCR, PDF text and page rendering, enabling dependency injection.
pub struct DocumentExtractor {
    ocr_engine: Box<dyn OcrEngine + Send + Sync>,
    pdf_extractor: Box<dyn PdfExtractor + Send + Sync>,
    pdf_renderer: Box<dyn PdfPageRenderer + Send + Sync>,
    render_dpi: u32,
}

impl DocumentExtractor {
    pub fn new(
        ocr_engine: Box<dyn OcrEngine + Send + Sync>,
        pdf_extractor: Box<dyn PdfExtractor + Send + Sync>,
        pdf_renderer: Box<dyn PdfPageRenderer + Send + Sync>,
    ) -> Self {
        Self {
            ocr_engine,
            pdf_extractor,
            pdf_renderer,
            render_dpi: DEFAULT_RENDER_DPI,
        }
    }

    /// Resolution used when a text-less page is rasterized for OCR.
    pub fn with_render_dpi(mut self, dpi: u32) -> Self {
        self.render_dpi = dpi;
        self
    }

    pub fn ocr_languages(&self) -> &str {
        self.ocr_engine.languages()
    }

    /// Direct text where the page has any, otherwise render + OCR.
    ///
    /// Every page contributes its text followed by a single `\n`. The first
    /// failing page aborts the whole document.
    fn extract_pdf(&self, pdf_bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        let direct_pages = self.pdf_extractor.extract_text(pdf_bytes)?;

        let mut text = String::new();
        let mut pages = Vec::with_capacity(direct_pages.len());

        for page in direct_pages {
            // pdf-extract emits layout whitespace for image-only pages
            let content = if page.text.trim().is_empty() {
                tracing::debug!(page = page.page_number, "No embedded text, falling back to OCR");
                let png = self.pdf_renderer.render_page(
                    pdf_bytes,
                    page.page_number - 1,
                    self.render_dpi,
                )?;
                let ocr = self.ocr_engine.ocr_image(&png)?;
                PageContent::OcrText {
                    text: ocr.text,
                    confidence: ocr.confidence,
                }
            } else {
                PageContent::DirectText { text: page.text }
            };

            text.push_str(content.text());
            text.push('\n');
            pages.push(PageExtraction {
                page_number: page.page_number,
                content,
            });
        }

        Ok(ExtractedText {
            kind: DocumentKind::Pdf,
            text,
            pages,
        })
    }

    fn extract_image(&self, image_bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        let ocr = self.ocr_engine.ocr_image(image_bytes)?;
        let text = ocr.text.clone();

        Ok(ExtractedText {
            kind: DocumentKind::Image,
            text,
            pages: vec![PageExtraction {
                page_number: 1,
                content: PageContent::OcrText {
                    text: ocr.text,
                    confidence: ocr.confidence,
                },
            }],
        })
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, document: &SourceDocument) -> Result<ExtractedText, ExtractionError> {
        let kind = document.kind();
        tracing::info!(kind = ?kind, "Starting text extraction");

        let result = match document {
            SourceDocument::Paged(bytes) => self.extract_pdf(bytes),
            SourceDocument::Raster(bytes) => self.extract_image(bytes),
        };

        match &result {
            Ok(extracted) => tracing::info!(
                kind = ?kind,
                pages = extracted.page_count(),
                ocr_pages = extracted.ocr_page_count(),
                text_length = extracted.text.len(),
                "Text extraction complete"
            ),
            Err(e) => tracing::warn!(kind = ?kind, error = %e, "Text extraction failed"),
        }

        result
    }
}

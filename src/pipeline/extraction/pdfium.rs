//! Primary page rasterizer for scanned CV pages, backed by PDFium.
//!
//! The `Pdfium` handle is `!Send`, so it is bound again on every call and
//! `PdfiumRenderer` itself holds nothing.

use std::io::Cursor;
use std::sync::Mutex;

use image::{DynamicImage, ImageOutputFormat};
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use super::types::PdfPageRenderer;
use super::ExtractionError;

/// Longest edge of a rendered page, in pixels.
const MAX_DIMENSION_PX: u32 = 4096;

const POINTS_PER_INCH: f32 = 72.0;

pub struct PdfiumRenderer;

impl PdfiumRenderer {
    /// Bind PDFium once so a missing library is reported at startup.
    ///
    /// The library is looked up at `PDFIUM_DYNAMIC_LIB_PATH`, then next to
    /// the executable (also `pdfium/` and `pdfium/lib/`), then on the system
    /// search path.
    pub fn new() -> Result<Self, ExtractionError> {
        load_pdfium()?;
        Ok(Self)
    }
}

fn unavailable(reason: String) -> ExtractionError {
    ExtractionError::PdfRendering { page: 0, reason }
}

fn load_pdfium() -> Result<Pdfium, ExtractionError> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let bindings = Pdfium::bind_to_library(&path)
            .map_err(|e| unavailable(format!("Cannot load PDFium from {path}: {e}")))?;
        debug!(path = %path, "PDFium bound from PDFIUM_DYNAMIC_LIB_PATH");
        return Ok(Pdfium::new(bindings));
    }

    for lib_path in bundled_library_paths() {
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!(path = %lib_path, "PDFium bound from executable directory");
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        unavailable(format!(
            "PDFium not found; install it or set PDFIUM_DYNAMIC_LIB_PATH ({e})"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

/// Platform-specific library file names next to the running binary.
fn bundled_library_paths() -> Vec<String> {
    let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
    else {
        return Vec::new();
    };

    [exe_dir.clone(), exe_dir.join("pdfium"), exe_dir.join("pdfium").join("lib")]
        .iter()
        .map(|dir| {
            Pdfium::pdfium_platform_library_name_at_path(dir.to_string_lossy().as_ref())
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

fn map_load_error(e: PdfiumError) -> ExtractionError {
    let msg = e.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        ExtractionError::PdfEncrypted
    } else {
        ExtractionError::PdfParsing(format!("PDFium could not open the document: {msg}"))
    }
}

/// Page size in points to pixels at `dpi`.
///
/// Both edges are at least 1px. When the longer edge would exceed
/// [`MAX_DIMENSION_PX`] the page is scaled down to fit, keeping its shape.
pub(crate) fn compute_render_dimensions(
    width_points: f32,
    height_points: f32,
    dpi: u32,
) -> (u32, u32) {
    let (w, h) = uncapped_dimensions(width_points, height_points, dpi);
    let longest = w.max(h);
    if longest <= MAX_DIMENSION_PX as f32 {
        return (w as u32, h as u32);
    }

    let shrink = MAX_DIMENSION_PX as f32 / longest;
    let fit = |edge: f32| ((edge * shrink) as u32).clamp(1, MAX_DIMENSION_PX);
    (fit(w), fit(h))
}

fn uncapped_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (f32, f32) {
    let px_per_point = dpi as f32 / POINTS_PER_INCH;
    (
        (width_points * px_per_point).max(1.0),
        (height_points * px_per_point).max(1.0),
    )
}

fn render_error(page: usize, reason: String) -> ExtractionError {
    ExtractionError::PdfRendering { page, reason }
}

impl PdfPageRenderer for PdfiumRenderer {
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        let page_number = page_index + 1;
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(map_load_error)?;
        let pages = document.pages();

        let page = u16::try_from(page_index)
            .ok()
            .and_then(|index| pages.get(index).ok())
            .ok_or_else(|| {
                render_error(
                    page_number,
                    format!("No page {page_number}, document has {} pages", pages.len()),
                )
            })?;

        let (width_pt, height_pt) = (page.width().value, page.height().value);
        let (width, height) = compute_render_dimensions(width_pt, height_pt, dpi);
        let (raw_w, raw_h) = uncapped_dimensions(width_pt, height_pt, dpi);
        if raw_w.max(raw_h) > MAX_DIMENSION_PX as f32 {
            warn!(page = page_number, raw_w, raw_h, width, height, "Oversized page scaled down");
        }

        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_maximum_height(height as i32);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| render_error(page_number, e.to_string()))?;

        let png = encode_png(&bitmap.as_image())?;
        debug!(page = page_number, width, height, bytes = png.len(), "Page rasterized");
        Ok(png)
    }
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ExtractionError> {
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

/// Stand-in rasterizer that returns a 1x1 white PNG for every page in range.
///
/// Records which page indexes were rendered so tests can assert that only
/// text-less pages reached the rasterizer.
pub struct MockPdfPageRenderer {
    page_count: usize,
    rendered: Mutex<Vec<usize>>,
}

impl MockPdfPageRenderer {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            rendered: Mutex::new(Vec::new()),
        }
    }

    /// 0-based indexes passed to `render_page`, in call order.
    pub fn rendered_pages(&self) -> Vec<usize> {
        self.rendered.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl PdfPageRenderer for MockPdfPageRenderer {
    fn render_page(
        &self,
        _pdf_bytes: &[u8],
        page_index: usize,
        _dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        if let Ok(mut rendered) = self.rendered.lock() {
            rendered.push(page_index);
        }
        if page_index >= self.page_count {
            return Err(render_error(
                page_index + 1,
                format!("No page {}, mock has {} pages", page_index + 1, self.page_count),
            ));
        }
        encode_png(&DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            1,
            1,
            image::Luma([255u8]),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_at_200dpi() {
        // US Letter = 612 x 792 points
        let (w, h) = compute_render_dimensions(612.0, 792.0, 200);
        assert!(w > 1650 && w < 1750, "Letter width at 200dpi: got {w}");
        assert!(h > 2150 && h < 2250, "Letter height at 200dpi: got {h}");
    }

    #[test]
    fn a4_at_300dpi() {
        let (w, h) = compute_render_dimensions(595.0, 842.0, 300);
        assert!(w > 2400 && w < 2550, "A4 width at 300dpi: got {w}");
        assert!(h > 3450 && h < 3600, "A4 height at 300dpi: got {h}");
    }

    #[test]
    fn dimension_guard_caps_and_keeps_aspect_ratio() {
        let (w, h) = compute_render_dimensions(5000.0, 10000.0, 200);
        assert!(w <= MAX_DIMENSION_PX && h <= MAX_DIMENSION_PX);
        let ratio = h as f32 / w as f32;
        assert!((ratio - 2.0).abs() < 0.15, "Aspect ratio should be ~2:1, got {ratio}");
    }

    #[test]
    fn zero_points_clamped_to_1() {
        let (w, h) = compute_render_dimensions(0.0, 0.0, 200);
        assert!(w >= 1, "Width must be >= 1, got {w}");
        assert!(h >= 1, "Height must be >= 1, got {h}");
    }

    #[test]
    fn mock_returns_png_and_records_page() {
        let mock = MockPdfPageRenderer::new(3);
        let png = mock.render_page(&[], 1, 200).unwrap();
        assert_eq!(&png[..4], &[0x89, 0x50, 0x4E, 0x47]); // PNG magic
        assert_eq!(mock.rendered_pages(), vec![1]);
    }

    #[test]
    fn mock_errors_for_out_of_range() {
        let mock = MockPdfPageRenderer::new(2);
        let err = mock.render_page(&[], 2, 200).unwrap_err();
        assert!(matches!(err, ExtractionError::PdfRendering { page: 3, .. }));
    }

    #[test]
    fn mock_png_decodes_to_white_pixel() {
        let png = MockPdfPageRenderer::new(1).render_page(&[], 0, 200).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (1, 1));
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn dimensions_within_cap_are_unchanged() {
        assert_eq!(compute_render_dimensions(72.0, 144.0, 72), (72, 144));
    }
}

//! Fallback page rasterizer built on lopdf, used when PDFium is not installed.
//!
//! Scanned CVs are almost always one image XObject per page, so "rendering"
//! the page means pulling out its largest embedded image. A page with no
//! image at all becomes a blank white bitmap of the page size, which OCRs to
//! an empty string instead of failing the whole document.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use lopdf::{Dictionary, Document, Object, ObjectId};

use super::pdfium::compute_render_dimensions;
use super::types::PdfPageRenderer;
use super::ExtractionError;

/// US Letter, for pages that carry no usable /MediaBox.
const DEFAULT_MEDIA_BOX: (f32, f32) = (612.0, 792.0);

pub struct EmbeddedImageRenderer;

impl PdfPageRenderer for EmbeddedImageRenderer {
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        let page_number = page_index + 1;
        let doc = Document::load_mem(pdf_bytes)
            .map_err(|e| ExtractionError::PdfParsing(format!("Failed to parse PDF: {e}")))?;

        let page_id = doc.page_iter().nth(page_index).ok_or_else(|| {
            ExtractionError::PdfRendering {
                page: page_number,
                reason: format!(
                    "Page {page_number} not found (PDF has {} pages)",
                    doc.get_pages().len()
                ),
            }
        })?;

        let img = match largest_page_image(&doc, page_id)? {
            Some(img) => img,
            None => {
                let (w_pt, h_pt) = media_box_size(&doc, page_id);
                let (w, h) = compute_render_dimensions(w_pt, h_pt, dpi);
                tracing::debug!(page = page_number, width = w, height = h, "No image on page, rendering blank");
                DynamicImage::ImageLuma8(image::GrayImage::from_pixel(w, h, image::Luma([255u8])))
            }
        };

        let mut png_buf = Cursor::new(Vec::new());
        img.write_to(&mut png_buf, ImageOutputFormat::Png)
            .map_err(|e| ExtractionError::ImageProcessing(format!("Failed to encode PNG: {e}")))?;

        tracing::debug!(
            page = page_number,
            png_size = png_buf.get_ref().len(),
            "Extracted page image with lopdf"
        );

        Ok(png_buf.into_inner())
    }
}

/// Decode every image XObject on the page and keep the one with the most pixels.
fn largest_page_image(
    doc: &Document,
    page_id: ObjectId,
) -> Result<Option<DynamicImage>, ExtractionError> {
    let page_dict = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| ExtractionError::PdfParsing(format!("Page object error: {e}")))?;

    let Some(xobjects) = resolve_dict(doc, page_dict, b"Resources")
        .and_then(|resources| resolve_dict(doc, resources, b"XObject"))
    else {
        return Ok(None);
    };

    let mut largest: Option<DynamicImage> = None;

    for (_name, obj_ref) in xobjects.iter() {
        let stream = match resolve(doc, obj_ref) {
            Object::Stream(s) => s,
            _ => continue,
        };

        let is_image = matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image");
        if !is_image {
            continue;
        }

        let img = match decode_image_stream(doc, stream) {
            Ok(img) => img,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable image XObject");
                continue;
            }
        };

        let area = |i: &DynamicImage| u64::from(i.width()) * u64::from(i.height());
        if largest.as_ref().map_or(true, |prev| area(&img) > area(prev)) {
            largest = Some(img);
        }
    }

    Ok(largest)
}

fn decode_image_stream(
    doc: &Document,
    stream: &lopdf::Stream,
) -> Result<DynamicImage, ExtractionError> {
    // DCTDecode streams are whole JPEG files; lopdf leaves them compressed.
    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    if let Ok(img) = image::load_from_memory(&content) {
        return Ok(img);
    }

    reconstruct_raw_image(doc, &stream.dict, &content)
}

/// Rebuild an image from raw samples using /Width, /Height and /ColorSpace.
/// Only 8 bits per component is supported.
fn reconstruct_raw_image(
    doc: &Document,
    dict: &Dictionary,
    raw: &[u8],
) -> Result<DynamicImage, ExtractionError> {
    let width = get_dimension(dict, b"Width")?;
    let height = get_dimension(dict, b"Height")?;
    let bpc = get_int(dict, b"BitsPerComponent").unwrap_or(8);
    if bpc != 8 {
        return Err(ExtractionError::ImageProcessing(format!(
            "Unsupported bits per component: {bpc}"
        )));
    }

    let channels = color_channels(doc, dict)?;
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(channels))
        .ok_or_else(|| {
            ExtractionError::ImageProcessing(format!(
                "Image dimensions overflow: {width}x{height}x{channels}"
            ))
        })?;
    if raw.len() < expected {
        return Err(ExtractionError::ImageProcessing(format!(
            "Raw pixel buffer too small: {} bytes, expected {expected} ({width}x{height}x{channels})",
            raw.len()
        )));
    }
    let raw = &raw[..expected];

    let invalid = || ExtractionError::ImageProcessing("Pixel buffer does not match dimensions".into());

    let img = match channels {
        1 => DynamicImage::ImageLuma8(
            image::GrayImage::from_raw(width, height, raw.to_vec()).ok_or_else(invalid)?,
        ),
        3 => DynamicImage::ImageRgb8(
            image::RgbImage::from_raw(width, height, raw.to_vec()).ok_or_else(invalid)?,
        ),
        4 => DynamicImage::ImageRgb8(
            image::RgbImage::from_raw(width, height, cmyk_to_rgb(raw)).ok_or_else(invalid)?,
        ),
        n => {
            return Err(ExtractionError::ImageProcessing(format!(
                "Unsupported channel count: {n}"
            )))
        }
    };

    Ok(img)
}

fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    cmyk.chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - u16::from(px[3]);
            let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}

/// Number of color components from /ColorSpace; RGB when unknown.
fn color_channels(doc: &Document, dict: &Dictionary) -> Result<usize, ExtractionError> {
    let Ok(cs) = dict.get(b"ColorSpace") else {
        return Ok(3);
    };

    let channels = match resolve(doc, cs) {
        Object::Name(n) => match n.as_slice() {
            b"DeviceGray" | b"CalGray" => 1,
            b"DeviceCMYK" => 4,
            _ => 3,
        },
        Object::Array(arr) => match arr.first() {
            Some(Object::Name(n)) if n == b"ICCBased" => arr
                .get(1)
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_stream().ok())
                .and_then(|s| get_int(&s.dict, b"N").ok())
                .map_or(Ok(3), |n| {
                    usize::try_from(n).map_err(|_| {
                        ExtractionError::ImageProcessing(format!("Invalid ICC component count: {n}"))
                    })
                })?,
            Some(Object::Name(n)) if n == b"Indexed" => 1,
            _ => 3,
        },
        _ => 3,
    };
    Ok(channels)
}

/// Page size in points from /MediaBox, following /Parent for inherited boxes.
fn media_box_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let mut current = doc.get_object(page_id).and_then(Object::as_dict).ok();

    while let Some(dict) = current {
        if let Ok(Object::Array(b)) = dict.get(b"MediaBox").map(|o| resolve(doc, o)) {
            let nums: Vec<f32> = b.iter().filter_map(|o| as_number(resolve(doc, o))).collect();
            if let [x0, y0, x1, y1] = nums[..] {
                return ((x1 - x0).abs(), (y1 - y0).abs());
            }
        }
        current = dict
            .get(b"Parent")
            .ok()
            .map(|p| resolve(doc, p))
            .and_then(|p| p.as_dict().ok());
    }

    DEFAULT_MEDIA_BOX
}

fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Resolve a PDF object reference to its target, or return the object as-is.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn resolve_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    dict.get(key).ok().and_then(|o| resolve(doc, o).as_dict().ok())
}

fn get_int(dict: &Dictionary, key: &[u8]) -> Result<i64, ExtractionError> {
    dict.get(key)
        .and_then(Object::as_i64)
        .map_err(|_| {
            ExtractionError::PdfParsing(format!(
                "Missing or non-integer /{} in image dictionary",
                String::from_utf8_lossy(key)
            ))
        })
}

/// /Width or /Height as a pixel count; negative or oversized values are rejected.
fn get_dimension(dict: &Dictionary, key: &[u8]) -> Result<u32, ExtractionError> {
    let value = get_int(dict, key)?;
    u32::try_from(value).map_err(|_| {
        ExtractionError::PdfParsing(format!(
            "Invalid /{} in image dictionary: {value}",
            String::from_utf8_lossy(key)
        ))
    })
}

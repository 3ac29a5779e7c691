//! PDF and image fixtures built in memory with lopdf and image.

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use lopdf::dictionary;
use lopdf::{Document, Object, ObjectId, Stream};

pub enum TestPage<'a> {
    /// A page with an embedded Helvetica text line.
    Text(&'a str),
    /// A "scanned" page: one JPEG image XObject, no text operators.
    Image,
    /// A page with an empty content stream.
    Blank,
}

/// Build a Letter-sized PDF, one page per entry.
pub fn make_pdf(pages: &[TestPage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for page in pages {
        let (content, resources) = match page {
            TestPage::Text(text) => (
                format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET"),
                dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            ),
            TestPage::Image => {
                let image_id = add_jpeg_xobject(&mut doc, 64, 48);
                (
                    "q 612 0 0 792 0 0 cm /Im1 Do Q".to_string(),
                    dictionary! {
                        "XObject" => dictionary! { "Im1" => image_id },
                    },
                )
            }
            TestPage::Blank => (String::new(), dictionary! {}),
        };

        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn add_jpeg_xobject(doc: &mut Document, width: u32, height: u32) -> ObjectId {
    let jpeg = encode_image(width, height, ImageOutputFormat::Jpeg(85));
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ))
}

/// Encode a light-gray RGB image.
pub fn encode_image(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([220u8, 220, 220])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn png_bytes() -> Vec<u8> {
    encode_image(32, 32, ImageOutputFormat::Png)
}

pub fn jpeg_bytes() -> Vec<u8> {
    encode_image(32, 32, ImageOutputFormat::Jpeg(85))
}

//! Raster images to PDF.
//!
//! Builds a document with one page per input image. Each page's MediaBox is
//! exactly the image's pixel dimensions, so a 100x200 px image becomes a
//! 100x200 pt page with the image drawn edge to edge.

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, GenericImageView};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::error::PdfOpError;

const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// An image ready to be embedded: JPEG data plus the metadata the PDF
/// image dictionary needs.
struct EmbeddableImage {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
    color_space: &'static [u8],
}

/// Build a PDF with one page per image, sized to the image's pixel
/// dimensions. At least one image is required.
///
/// JPEG inputs are embedded byte for byte under a DCTDecode filter; other
/// raster formats (PNG, GIF, ...) are decoded and re-encoded to JPEG first.
pub fn images_to_pdf(images: &[Vec<u8>]) -> Result<Vec<u8>, PdfOpError> {
    if images.is_empty() {
        return Err(PdfOpError::NotEnoughInputs {
            required: 1,
            got: 0,
        });
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(images.len());
    for bytes in images {
        let embeddable = prepare_image(bytes)?;
        let page_id = add_image_page(&mut doc, pages_id, embeddable);
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => Object::Name(b"Pages".to_vec()),
            "Kids" => Object::Array(kids),
            "Count" => Object::Integer(page_count as i64),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Catalog".to_vec()),
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfOpError::Operation(format!("Failed to save PDF: {}", e)))?;
    Ok(buffer)
}

/// Decode the image for its dimensions and color space; keep JPEG bytes
/// as-is, transcode everything else to JPEG.
fn prepare_image(bytes: &[u8]) -> Result<EmbeddableImage, PdfOpError> {
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = decoded.dimensions();

    let color_space: &'static [u8] = match decoded.color() {
        ColorType::L8 | ColorType::L16 => b"DeviceGray",
        _ => b"DeviceRGB",
    };

    let jpeg = if bytes.starts_with(&JPEG_MAGIC) {
        bytes.to_vec()
    } else if color_space == b"DeviceGray" {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 90).encode_image(&decoded.to_luma8())?;
        out
    } else {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 90).encode_image(&decoded.to_rgb8())?;
        out
    };

    Ok(EmbeddableImage {
        jpeg,
        width,
        height,
        color_space,
    })
}

/// Add one page drawing the image across the whole MediaBox.
fn add_image_page(doc: &mut Document, pages_id: lopdf::ObjectId, img: EmbeddableImage) -> lopdf::ObjectId {
    let image_dict = dictionary! {
        "Type" => Object::Name(b"XObject".to_vec()),
        "Subtype" => Object::Name(b"Image".to_vec()),
        "Width" => Object::Integer(img.width as i64),
        "Height" => Object::Integer(img.height as i64),
        "ColorSpace" => Object::Name(img.color_space.to_vec()),
        "BitsPerComponent" => Object::Integer(8),
        "Filter" => Object::Name(b"DCTDecode".to_vec()),
    };
    let image_id = doc.add_object(Object::Stream(Stream::new(image_dict, img.jpeg)));

    let content = format!("q\n{} 0 0 {} 0 0 cm\n/Im0 Do\nQ", img.width, img.height);
    let content_id = doc.add_object(Object::Stream(Stream::new(
        Dictionary::new(),
        content.into_bytes(),
    )));

    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    doc.add_object(dictionary! {
        "Type" => Object::Name(b"Page".to_vec()),
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(img.width as i64),
            Object::Integer(img.height as i64),
        ]),
        "Resources" => Object::Dictionary(resources),
        "Contents" => Object::Reference(content_id),
    })
}

//! PDF assembly for the pdfbridge gateway.
//!
//! Everything here operates on in-memory byte buffers using lopdf:
//! merging documents, turning raster images into pages, recompressing
//! streams, and counting pages. No HTTP or filesystem concerns leak in.

pub mod error;
pub mod images;
pub mod merge;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::PdfOpError;
pub use images::images_to_pdf;
pub use merge::merge_documents;

/// Parse PDF bytes and return the page count.
pub fn page_count(bytes: &[u8]) -> Result<u32, PdfOpError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| PdfOpError::Parse(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

/// Re-serialize a PDF with lopdf's stream compression applied.
///
/// This is a cheap recompression pass, not a full optimizer: content streams
/// get deflated, but images are untouched and fonts are not subset.
pub fn recompress(bytes: &[u8]) -> Result<Vec<u8>, PdfOpError> {
    let mut doc = lopdf::Document::load_mem(bytes).map_err(|e| PdfOpError::Parse(e.to_string()))?;
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfOpError::Operation(format!("Failed to save PDF: {}", e)))?;
    Ok(buffer)
}

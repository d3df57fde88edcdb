//! PDF merge.
//!
//! Combines several PDFs into one document, preserving input order and the
//! page order inside each input.

use lopdf::{Document, Object, ObjectId};

use crate::error::PdfOpError;

/// Merge two or more PDFs into a single document.
///
/// The first input becomes the base document. Every further input has its
/// object IDs shifted past the base's `max_id` so nothing collides, its
/// objects are moved across, and its pages are appended to the base's page
/// tree. Fewer than two inputs is a caller error.
pub fn merge_documents(inputs: &[Vec<u8>]) -> Result<Vec<u8>, PdfOpError> {
    if inputs.len() < 2 {
        return Err(PdfOpError::NotEnoughInputs {
            required: 2,
            got: inputs.len(),
        });
    }

    let mut dest = load_input(&inputs[0], 0)?;
    let mut page_refs = ordered_pages(&dest);

    for (i, bytes) in inputs.iter().enumerate().skip(1) {
        let source = load_input(bytes, i)?;
        append_document(&mut dest, source, &mut page_refs);
    }

    rebuild_page_tree(&mut dest, &page_refs)?;
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| PdfOpError::Operation(format!("Failed to save merged PDF: {}", e)))?;
    Ok(buffer)
}

fn load_input(bytes: &[u8], index: usize) -> Result<Document, PdfOpError> {
    Document::load_mem(bytes)
        .map_err(|e| PdfOpError::Parse(format!("Failed to load document {}: {}", index, e)))
}

/// Move all objects of `source` into `dest` under shifted IDs and record the
/// source's pages, in order, at the end of `page_refs`.
fn append_document(dest: &mut Document, source: Document, page_refs: &mut Vec<ObjectId>) {
    let offset = dest.max_id;
    let source_max_id = source.max_id;

    for page_id in ordered_pages(&source) {
        page_refs.push((page_id.0 + offset, page_id.1));
    }

    for (old_id, mut object) in source.objects {
        shift_refs(&mut object, offset);
        dest.objects.insert((old_id.0 + offset, old_id.1), object);
    }

    dest.max_id = (source_max_id + offset).max(dest.max_id);
}

/// Page object IDs in document page order.
fn ordered_pages(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// Shift every indirect reference inside `obj` by `offset`, in place.
fn shift_refs(obj: &mut Object, offset: u32) {
    match obj {
        Object::Reference(id) => id.0 += offset,
        Object::Array(items) => {
            for item in items.iter_mut() {
                shift_refs(item, offset);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                shift_refs(value, offset);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                shift_refs(value, offset);
            }
        }
        _ => {}
    }
}

/// Point the destination's page tree at the merged page list.
fn rebuild_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> Result<(), PdfOpError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| PdfOpError::Operation("No catalog reference in trailer".into()))?;

    let pages_id = doc
        .objects
        .get(&catalog_id)
        .ok_or_else(|| PdfOpError::Operation("Catalog object missing".into()))?
        .as_dict()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|_| PdfOpError::Operation("Catalog has no Pages reference".into()))?;

    match doc.objects.get_mut(&pages_id) {
        Some(Object::Dictionary(pages)) => {
            let kids: Vec<Object> = page_refs.iter().map(|&id| Object::Reference(id)).collect();
            pages.set("Kids", Object::Array(kids));
            pages.set("Count", Object::Integer(page_refs.len() as i64));

            // Pages appended from other documents must point at this root.
            for &page_id in page_refs {
                if let Some(Object::Dictionary(page)) = doc.objects.get_mut(&page_id) {
                    page.set("Parent", Object::Reference(pages_id));
                }
            }
            Ok(())
        }
        _ => Err(PdfOpError::Operation("Invalid pages dictionary".into())),
    }
}

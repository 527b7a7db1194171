//! Combine per-record documents into one deliverable buffer.
//!
//! Object ids from each source are offset past the destination's current
//! maximum so references never collide, then the destination page tree
//! and interactive form are rebuilt over the combined page and field
//! lists.

use crate::error::RosterPdfError;
use crate::RenderedDocument;
use lopdf::{Document, Object, ObjectId};

/// Merge rendered documents in order. Applied-field lists concatenate in
/// the same order as the pages.
pub fn merge_rendered(documents: &[RenderedDocument]) -> Result<RenderedDocument, RosterPdfError> {
    let first = match documents {
        [] => {
            return Err(RosterPdfError::Operation(
                "no documents to merge".to_string(),
            ))
        }
        [only] => return Ok(only.clone()),
        [first, ..] => first,
    };

    let mut dest = Document::load_mem(&first.bytes)
        .map_err(|e| RosterPdfError::Parse(format!("document 0: {e}")))?;
    let mut page_refs = page_references(&dest);
    let mut form_refs = acroform_field_refs(&dest);
    let mut fallback_form = acroform_ref(&dest);
    let mut applied_fields = first.applied_fields.clone();

    for (index, source_doc) in documents.iter().enumerate().skip(1) {
        let source = Document::load_mem(&source_doc.bytes)
            .map_err(|e| RosterPdfError::Parse(format!("document {index}: {e}")))?;

        let offset = dest.max_id;
        let source_max = source.max_id;

        for page_id in page_references(&source) {
            page_refs.push((page_id.0 + offset, page_id.1));
        }
        for field_id in acroform_field_refs(&source) {
            form_refs.push((field_id.0 + offset, field_id.1));
        }
        if fallback_form.is_none() {
            fallback_form = acroform_ref(&source).map(|id| (id.0 + offset, id.1));
        }
        for (old_id, object) in source.objects {
            dest.objects
                .insert((old_id.0 + offset, old_id.1), offset_refs(object, offset));
        }
        dest.max_id = source_max + offset;
        applied_fields.extend(source_doc.applied_fields.iter().cloned());
    }

    rebuild_page_tree(&mut dest, &page_refs)?;
    rebuild_acroform(&mut dest, &form_refs, fallback_form)?;
    dest.compress();

    tracing::debug!(
        documents = documents.len(),
        pages = page_refs.len(),
        "merged rendered documents"
    );

    let mut bytes = Vec::new();
    dest.save_to(&mut bytes)
        .map_err(|e| RosterPdfError::Operation(e.to_string()))?;

    Ok(RenderedDocument {
        bytes,
        applied_fields,
    })
}

fn page_references(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

fn catalog_ref(doc: &Document) -> Option<ObjectId> {
    doc.trailer.get(b"Root").and_then(Object::as_reference).ok()
}

/// The document's AcroForm dictionary reference, if it carries one.
fn acroform_ref(doc: &Document) -> Option<ObjectId> {
    let catalog_id = catalog_ref(doc)?;
    doc.get_object(catalog_id)
        .and_then(Object::as_dict)
        .and_then(|catalog| catalog.get(b"AcroForm"))
        .and_then(Object::as_reference)
        .ok()
}

/// References held by the AcroForm `Fields` array; empty when the
/// document has no interactive fields.
fn acroform_field_refs(doc: &Document) -> Vec<ObjectId> {
    let Some(form_id) = acroform_ref(doc) else {
        return Vec::new();
    };
    doc.get_object(form_id)
        .and_then(Object::as_dict)
        .and_then(|form| form.get(b"Fields"))
        .and_then(Object::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f.as_reference().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Shift every object reference by `offset`, recursing through arrays,
/// dictionaries, and stream dictionaries.
fn offset_refs(object: Object, offset: u32) -> Object {
    match object {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(items) => {
            Object::Array(items.into_iter().map(|o| offset_refs(o, offset)).collect())
        }
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = offset_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = offset_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

fn rebuild_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> Result<(), RosterPdfError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| RosterPdfError::Operation(format!("trailer root: {e}")))?;

    let pages_id = doc
        .get_object(catalog_id)
        .and_then(Object::as_dict)
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| RosterPdfError::Operation(format!("page tree root: {e}")))?;

    let kids: Vec<Object> = page_refs.iter().map(|id| Object::Reference(*id)).collect();
    let count = kids.len() as i64;

    let pages = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| RosterPdfError::Operation(format!("page tree node: {e}")))?;
    pages.set("Kids", Object::Array(kids));
    pages.set("Count", Object::Integer(count));

    // Every page must point at the surviving tree node.
    for page_id in page_refs {
        if let Ok(page) = doc.get_object_mut(*page_id) {
            if let Ok(dict) = page.as_dict_mut() {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
    }
    Ok(())
}

/// Register the combined field list on one surviving AcroForm, the same
/// way `rebuild_page_tree` rebuilds `Kids`. Documents without any
/// interactive fields are left alone.
fn rebuild_acroform(
    doc: &mut Document,
    field_refs: &[ObjectId],
    fallback_form: Option<ObjectId>,
) -> Result<(), RosterPdfError> {
    if field_refs.is_empty() {
        return Ok(());
    }
    let form_id = match acroform_ref(doc).or(fallback_form) {
        Some(id) => id,
        None => return Ok(()),
    };

    // The first document may have carried no form of its own.
    if acroform_ref(doc).is_none() {
        let catalog_id = catalog_ref(doc)
            .ok_or_else(|| RosterPdfError::Operation("missing document catalog".to_string()))?;
        let catalog = doc
            .get_object_mut(catalog_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| RosterPdfError::Operation(format!("document catalog: {e}")))?;
        catalog.set("AcroForm", Object::Reference(form_id));
    }

    let fields: Vec<Object> = field_refs.iter().map(|id| Object::Reference(*id)).collect();
    let form = doc
        .get_object_mut(form_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| RosterPdfError::Operation(format!("form dictionary: {e}")))?;
    form.set("Fields", Object::Array(fields));
    Ok(())
}

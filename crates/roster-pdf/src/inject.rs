//! Field injector.
//!
//! Overlays interactive text fields onto an already-rendered base
//! document. The interactive-field backend uses the native PDF
//! convention (origin bottom-left, y up), while layouts speak the
//! logical convention (origin top-left, y down); the transform between
//! the two lives here and nowhere else:
//!
//! ```text
//! y' = page_height - y - field_height    (x unchanged)
//! ```
//!
//! Every field rectangle is bounds-checked after transform and BEFORE
//! any annotation is written, so a bad layout never produces a partial
//! document.

use crate::error::RosterPdfError;
use crate::layout::{DocumentLayout, FieldBinding, FieldSpec, LogicalRect};
use crate::RenderedDocument;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};
use shared_types::Decision;

/// A field rectangle in the interactive backend's bottom-left space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Convert a logical rectangle to the interactive backend's convention.
pub fn to_pdf_space(rect: &LogicalRect, page_height: f64) -> PdfRect {
    PdfRect {
        x: rect.x,
        y: page_height - rect.y - rect.height,
        width: rect.width,
        height: rect.height,
    }
}

/// Overlay the layout's interactive fields, valued from `decision`, onto
/// the base document.
pub fn inject_fields(
    base: &RenderedDocument,
    layout: &DocumentLayout,
    decision: &Decision,
) -> Result<RenderedDocument, RosterPdfError> {
    // Transform and bounds-check every field up front.
    let mut placed: Vec<(&FieldSpec, PdfRect)> = Vec::with_capacity(layout.fields.len());
    for field in &layout.fields {
        let rect = to_pdf_space(&field.rect, layout.page.height);
        check_bounds(field, rect, layout.page.width, layout.page.height)?;
        placed.push((field, rect));
    }

    let mut doc =
        Document::load_mem(&base.bytes).map_err(|e| RosterPdfError::Parse(e.to_string()))?;

    let page_id = first_page(&doc)?;
    let form_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut field_refs = Vec::with_capacity(placed.len());
    let mut applied_fields = Vec::with_capacity(placed.len());

    for (field, rect) in placed {
        let value = resolve_binding(decision, field.binding).unwrap_or_default();
        let annot_id = doc.add_object(Object::Dictionary(widget_dict(field, rect, &value)));
        attach_to_page(&mut doc, page_id, annot_id)?;
        field_refs.push(Object::Reference(annot_id));
        applied_fields.push(field.name.clone());
    }

    install_acroform(&mut doc, field_refs, form_font_id)?;

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RosterPdfError::Operation(e.to_string()))?;

    let mut all_applied = base.applied_fields.clone();
    all_applied.extend(applied_fields);

    Ok(RenderedDocument {
        bytes,
        applied_fields: all_applied,
    })
}

fn check_bounds(
    field: &FieldSpec,
    rect: PdfRect,
    page_width: f64,
    page_height: f64,
) -> Result<(), RosterPdfError> {
    let out_of_bounds = rect.x < 0.0
        || rect.y < 0.0
        || rect.x + rect.width > page_width
        || rect.y + rect.height > page_height;
    if out_of_bounds {
        return Err(RosterPdfError::FieldPlacement {
            name: field.name.clone(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        });
    }
    Ok(())
}

/// Resolve a binding path against the decision. `None` means the bound
/// attribute is legitimately absent and the field stays blank.
pub fn resolve_binding(decision: &Decision, binding: FieldBinding) -> Option<String> {
    match binding {
        FieldBinding::EntityId => Some(decision.entity_id.clone()),
        FieldBinding::CycleId => Some(decision.cycle_id.clone()),
        FieldBinding::Eligible => Some(if decision.eligible {
            "ELIGIBLE".to_string()
        } else {
            "INELIGIBLE".to_string()
        }),
        FieldBinding::ReasonCode => Some(decision.reason_code.as_str().to_string()),
        FieldBinding::EvaluatedAt => Some(decision.evaluated_at.to_string()),
        FieldBinding::SourceRuleId => decision.source_rule_id.clone(),
    }
}

fn widget_dict(field: &FieldSpec, rect: PdfRect, value: &str) -> Dictionary {
    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Widget".to_vec()));
    annot.set("FT", Object::Name(b"Tx".to_vec()));
    annot.set(
        "T",
        Object::String(field.name.as_bytes().to_vec(), StringFormat::Literal),
    );
    annot.set(
        "V",
        Object::String(value.as_bytes().to_vec(), StringFormat::Literal),
    );
    annot.set(
        "Rect",
        Object::Array(vec![
            Object::Real(rect.x as f32),
            Object::Real(rect.y as f32),
            Object::Real((rect.x + rect.width) as f32),
            Object::Real((rect.y + rect.height) as f32),
        ]),
    );
    annot.set(
        "DA",
        Object::String(b"/Helv 10 Tf 0 g".to_vec(), StringFormat::Literal),
    );
    // Print flag.
    annot.set("F", Object::Integer(4));
    annot
}

fn first_page(doc: &Document) -> Result<ObjectId, RosterPdfError> {
    doc.get_pages()
        .into_iter()
        .next()
        .map(|(_, id)| id)
        .ok_or_else(|| RosterPdfError::Parse("document has no pages".into()))
}

fn attach_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> Result<(), RosterPdfError> {
    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| RosterPdfError::Operation(e.to_string()))?;

    if let Object::Dictionary(ref mut page_dict) = page {
        if let Ok(Object::Array(ref mut arr)) = page_dict.get_mut(b"Annots") {
            arr.push(Object::Reference(annot_id));
        } else {
            page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
        }
    }
    Ok(())
}

fn install_acroform(
    doc: &mut Document,
    field_refs: Vec<Object>,
    form_font_id: ObjectId,
) -> Result<(), RosterPdfError> {
    let acroform_id = doc.add_object(dictionary! {
        "Fields" => Object::Array(field_refs),
        "DA" => Object::String(b"/Helv 10 Tf 0 g".to_vec(), StringFormat::Literal),
        "DR" => dictionary! {
            "Font" => dictionary! {
                "Helv" => Object::Reference(form_font_id),
            },
        },
    });

    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| RosterPdfError::Operation(e.to_string()))?;

    let catalog = doc
        .get_object_mut(catalog_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| RosterPdfError::Operation(e.to_string()))?;
    catalog.set("AcroForm", Object::Reference(acroform_id));
    Ok(())
}

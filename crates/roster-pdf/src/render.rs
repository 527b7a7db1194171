//! Base document renderer.
//!
//! Draws static regions only, into a fresh PDF; a table region with more
//! rows than fit on one page continues onto additional pages. Layout
//! coordinates are logical (top-left origin, y down); this module owns
//! the conversion to the PDF content-stream convention (bottom-left
//! origin, y up). Output is fully deterministic: the same layout and
//! content always produce byte-identical buffers.

use crate::error::RosterPdfError;
use crate::layout::{DocumentLayout, StaticRegion, TextContent};
use crate::RenderedDocument;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, StringFormat};
use std::collections::BTreeMap;

/// Text values for the layout's content-keyed regions.
pub type StaticContent = BTreeMap<String, String>;

const BODY_FONT: &[u8] = b"F1";
const BOLD_FONT: &[u8] = b"F2";

/// Render a layout's static regions into a new PDF.
///
/// Table regions whose rows exceed their per-page capacity continue on
/// additional pages; the non-table regions repeat on every page. Rows
/// are never drawn past a table's `max_y`.
pub fn render_base(
    layout: &DocumentLayout,
    content: &StaticContent,
) -> Result<RenderedDocument, RosterPdfError> {
    let page_count = page_count(layout, content)?;

    let mut pages = Vec::with_capacity(page_count);
    for page_index in 0..page_count {
        pages.push(page_operations(layout, content, page_index)?);
    }

    let mut doc = build_document(layout.page.width, layout.page.height, pages)?;
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RosterPdfError::Operation(e.to_string()))?;

    Ok(RenderedDocument {
        bytes,
        applied_fields: Vec::new(),
    })
}

/// Rows that fit between a table's origin and its `max_y`.
fn table_capacity(y: f64, row_height: f64, max_y: f64) -> Result<usize, RosterPdfError> {
    if row_height <= 0.0 || max_y <= y {
        return Err(RosterPdfError::Operation(format!(
            "table region has no row capacity (y={y}, row_height={row_height}, max_y={max_y})"
        )));
    }
    Ok(((max_y - y) / row_height).floor().max(1.0) as usize)
}

fn table_row_count(content: &StaticContent, key_prefix: &str) -> usize {
    let mut rows = 0;
    while content.contains_key(&format!("{key_prefix}{rows}")) {
        rows += 1;
    }
    rows
}

fn page_count(layout: &DocumentLayout, content: &StaticContent) -> Result<usize, RosterPdfError> {
    let mut pages = 1usize;
    for region in &layout.regions {
        if let StaticRegion::TableRows {
            y,
            row_height,
            key_prefix,
            max_y,
            ..
        } = region
        {
            let capacity = table_capacity(*y, *row_height, *max_y)?;
            let rows = table_row_count(content, key_prefix);
            pages = pages.max(rows.div_ceil(capacity).max(1));
        }
    }
    Ok(pages)
}

fn page_operations(
    layout: &DocumentLayout,
    content: &StaticContent,
    page_index: usize,
) -> Result<Vec<Operation>, RosterPdfError> {
    let page_height = layout.page.height;
    let mut operations = Vec::new();

    for region in &layout.regions {
        match region {
            StaticRegion::Text {
                x,
                y,
                size,
                bold,
                content: text,
            } => {
                if let Some(value) = resolve_text(text, content) {
                    operations.extend(text_ops(*x, page_height - y, *size, *bold, value));
                }
            }
            StaticRegion::Line { x, y, width } => {
                operations.extend(line_ops(*x, page_height - y, *width));
            }
            StaticRegion::Frame {
                x,
                y,
                width,
                height,
            } => {
                // Logical top edge maps to the PDF rect's upper bound.
                operations.extend(frame_ops(*x, page_height - y - height, *width, *height));
            }
            StaticRegion::TableRows {
                x,
                y,
                row_height,
                size,
                key_prefix,
                max_y,
            } => {
                let capacity = table_capacity(*y, *row_height, *max_y)?;
                let rows = table_row_count(content, key_prefix);
                let start = page_index * capacity;
                let end = rows.min(start + capacity);
                for row in start..end {
                    if let Some(value) = content.get(&format!("{key_prefix}{row}")) {
                        let row_y = y + row_height * (row - start) as f64;
                        operations.extend(text_ops(*x, page_height - row_y, *size, false, value));
                    }
                }
            }
        }
    }
    Ok(operations)
}

fn resolve_text<'a>(text: &'a TextContent, content: &'a StaticContent) -> Option<&'a str> {
    match text {
        TextContent::Literal { text } => Some(text),
        TextContent::ContentKey { key } => content.get(key).map(String::as_str),
    }
}

fn text_ops(x: f64, baseline_y: f64, size: f64, bold: bool, value: &str) -> Vec<Operation> {
    let font = if bold { BOLD_FONT } else { BODY_FONT };
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font.to_vec()), Object::Real(size as f32)],
        ),
        Operation::new(
            "Td",
            vec![Object::Real(x as f32), Object::Real(baseline_y as f32)],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(
                value.as_bytes().to_vec(),
                StringFormat::Literal,
            )],
        ),
        Operation::new("ET", vec![]),
    ]
}

fn line_ops(x: f64, y: f64, width: f64) -> Vec<Operation> {
    vec![
        Operation::new("w", vec![Object::Real(0.5)]),
        Operation::new("m", vec![Object::Real(x as f32), Object::Real(y as f32)]),
        Operation::new(
            "l",
            vec![Object::Real((x + width) as f32), Object::Real(y as f32)],
        ),
        Operation::new("S", vec![]),
    ]
}

fn frame_ops(x: f64, y: f64, width: f64, height: f64) -> Vec<Operation> {
    vec![
        Operation::new("w", vec![Object::Real(0.5)]),
        Operation::new(
            "re",
            vec![
                Object::Real(x as f32),
                Object::Real(y as f32),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ],
        ),
        Operation::new("S", vec![]),
    ]
}

fn build_document(
    width: f64,
    height: f64,
    pages: Vec<Vec<Operation>>,
) -> Result<Document, RosterPdfError> {
    let mut doc = Document::with_version("1.5");

    let body_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });

    let mut page_ids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| RosterPdfError::Operation(e.to_string()))?;
        let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, encoded));

        let resources = dictionary! {
            "Font" => dictionary! {
                "F1" => Object::Reference(body_font_id),
                "F2" => Object::Reference(bold_font_id),
            },
        };

        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Dictionary(resources),
        }));
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    let count = kids.len() as i64;
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    });

    for page_id in &page_ids {
        if let Ok(page) = doc.get_object_mut(*page_id) {
            if let Ok(dict) = page.as_dict_mut() {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DocumentKind, LayoutRegistry, PageSize};
    use pretty_assertions::assert_eq;

    fn certificate_content() -> StaticContent {
        StaticContent::from([
            ("title".to_string(), "25E6 Promotion Cycle".to_string()),
            ("unit".to_string(), "51 FSS".to_string()),
            (
                "accounting_date".to_string(),
                "Accounting Date: 2024-10-03".to_string(),
            ),
        ])
    }

    #[test]
    fn test_render_produces_a_parseable_pdf() {
        let registry = LayoutRegistry::standard();
        let layout = registry
            .layout_for(DocumentKind::EligibilityCertificate)
            .unwrap();
        let doc = render_base(layout, &certificate_content()).unwrap();

        assert!(doc.bytes.starts_with(b"%PDF-"));
        let parsed = Document::load_mem(&doc.bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
        assert!(doc.applied_fields.is_empty());
    }

    #[test]
    fn test_render_is_deterministic() {
        let registry = LayoutRegistry::standard();
        let layout = registry
            .layout_for(DocumentKind::EligibilityCertificate)
            .unwrap();
        let first = render_base(layout, &certificate_content()).unwrap();
        let second = render_base(layout, &certificate_content()).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_missing_content_key_leaves_region_blank() {
        let registry = LayoutRegistry::standard();
        let layout = registry
            .layout_for(DocumentKind::EligibilityCertificate)
            .unwrap();
        // No content at all: every keyed region is skipped, but the
        // document still renders.
        let doc = render_base(layout, &StaticContent::new()).unwrap();
        assert!(doc.bytes.starts_with(b"%PDF-"));
    }

    fn min_text_y(doc: &Document) -> f32 {
        let mut min_y = f32::MAX;
        for page_id in doc.get_pages().into_values() {
            let data = doc.get_page_content(page_id).unwrap();
            let content = Content::decode(&data).unwrap();
            for op in content.operations {
                if op.operator == "Td" {
                    if let Object::Real(y) = op.operands[1] {
                        min_y = min_y.min(y);
                    }
                }
            }
        }
        min_y
    }

    #[test]
    fn test_long_roster_paginates_instead_of_overflowing() {
        let registry = LayoutRegistry::standard();
        let layout = registry.layout_for(DocumentKind::BoardRoster).unwrap();

        let mut content = certificate_content();
        for i in 0..40 {
            content.insert(format!("row_{i}"), format!("member-{i}  E6  ELIGIBLE"));
        }

        let doc = render_base(layout, &content).unwrap();
        let parsed = Document::load_mem(&doc.bytes).unwrap();
        // 22 rows fit above the footer band, so 40 rows need two pages.
        assert_eq!(parsed.get_pages().len(), 2);
        // Nothing is ever drawn below the page bottom.
        assert!(min_text_y(&parsed) >= 0.0);
    }

    #[test]
    fn test_table_without_row_capacity_is_an_error() {
        let layout = DocumentLayout {
            page: PageSize::letter(),
            regions: vec![StaticRegion::TableRows {
                x: 54.0,
                y: 400.0,
                row_height: 16.0,
                size: 9.0,
                key_prefix: "row_".to_string(),
                max_y: 400.0,
            }],
            fields: vec![],
        };
        let mut content = StaticContent::new();
        content.insert("row_0".to_string(), "only row".to_string());
        assert!(matches!(
            render_base(&layout, &content),
            Err(RosterPdfError::Operation(_))
        ));
    }

    #[test]
    fn test_table_rows_follow_content_map() {
        let registry = LayoutRegistry::standard();
        let layout = registry.layout_for(DocumentKind::BoardRoster).unwrap();

        let mut content = certificate_content();
        content.insert("row_0".to_string(), "DOE, JANE  SSG".to_string());
        content.insert("row_1".to_string(), "ROE, RICHARD  SSG".to_string());

        let with_rows = render_base(layout, &content).unwrap();
        let without_rows = render_base(layout, &certificate_content()).unwrap();
        // Extra rows mean extra content-stream bytes.
        assert!(with_rows.bytes.len() > without_rows.bytes.len());
    }
}

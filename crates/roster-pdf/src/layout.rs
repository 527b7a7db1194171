//! Declarative document layouts.
//!
//! A layout describes static content regions and interactive field
//! positions in a single logical coordinate space: origin at the top-left
//! corner, y increasing downward, units in PDF points. Renderers convert
//! to their native conventions; layout authors never do.
//!
//! Concrete layouts are data: a shared base layout merged with
//! kind-specific overlays, dispatched through a registry keyed by a
//! closed set of document kinds.

use crate::error::RosterPdfError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn letter() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
        }
    }

    pub fn landscape_letter() -> Self {
        Self {
            width: 792.0,
            height: 612.0,
        }
    }
}

/// A rectangle in the logical (top-left origin) space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where a static text region gets its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TextContent {
    /// Fixed text baked into the layout.
    Literal { text: String },
    /// Looked up in the per-document content map; a missing key leaves
    /// the region blank.
    ContentKey { key: String },
}

/// One static region of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StaticRegion {
    Text {
        x: f64,
        y: f64,
        size: f64,
        bold: bool,
        content: TextContent,
    },
    /// Horizontal rule.
    Line { x: f64, y: f64, width: f64 },
    /// Rectangle outline.
    Frame {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Consecutive text rows driven by `{key_prefix}0`, `{key_prefix}1`,
    /// ... entries in the content map. Used for roster tables. Rows that
    /// would pass `max_y` continue on the next page.
    TableRows {
        x: f64,
        y: f64,
        row_height: f64,
        size: f64,
        key_prefix: String,
        max_y: f64,
    },
}

/// Path into a Decision that supplies an interactive field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldBinding {
    EntityId,
    CycleId,
    Eligible,
    ReasonCode,
    EvaluatedAt,
    /// Optional in the Decision; an absent value leaves the field blank.
    SourceRuleId,
}

/// One interactive field: name, logical position, value binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub rect: LogicalRect,
    pub binding: FieldBinding,
}

/// Full layout for one document kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub page: PageSize,
    pub regions: Vec<StaticRegion>,
    pub fields: Vec<FieldSpec>,
}

/// Kind-specific additions applied on top of the base layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutOverlay {
    pub page: Option<PageSize>,
    #[serde(default)]
    pub regions: Vec<StaticRegion>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl DocumentLayout {
    /// Merge an overlay into this layout: the overlay may swap the page
    /// size, appends regions, and appends fields (replacing a base field
    /// of the same name rather than duplicating it).
    pub fn merged(&self, overlay: &LayoutOverlay) -> DocumentLayout {
        let mut merged = self.clone();
        if let Some(page) = overlay.page {
            merged.page = page;
        }
        merged.regions.extend(overlay.regions.iter().cloned());
        for field in &overlay.fields {
            if let Some(existing) = merged.fields.iter_mut().find(|f| f.name == field.name) {
                *existing = field.clone();
            } else {
                merged.fields.push(field.clone());
            }
        }
        merged
    }
}

/// The closed set of documents this system produces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DocumentKind {
    EligibilityCertificate,
    IneligibilityNotice,
    BoardRoster,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::EligibilityCertificate => "eligibility-certificate",
            DocumentKind::IneligibilityNotice => "ineligibility-notice",
            DocumentKind::BoardRoster => "board-roster",
        };
        f.write_str(name)
    }
}

/// Lookup of assembled layouts per document kind.
#[derive(Debug, Clone)]
pub struct LayoutRegistry {
    layouts: BTreeMap<DocumentKind, DocumentLayout>,
}

impl LayoutRegistry {
    /// Assemble a registry from a base layout and per-kind overlays.
    pub fn from_overlays(
        base: DocumentLayout,
        overlays: Vec<(DocumentKind, LayoutOverlay)>,
    ) -> Self {
        let layouts = overlays
            .into_iter()
            .map(|(kind, overlay)| (kind, base.merged(&overlay)))
            .collect();
        Self { layouts }
    }

    /// Assemble a registry from fully-built layouts.
    pub fn from_layouts(layouts: Vec<(DocumentKind, DocumentLayout)>) -> Self {
        Self {
            layouts: layouts.into_iter().collect(),
        }
    }

    pub fn layout_for(&self, kind: DocumentKind) -> Result<&DocumentLayout, RosterPdfError> {
        self.layouts
            .get(&kind)
            .ok_or_else(|| RosterPdfError::UnknownDocumentKind(kind.to_string()))
    }

    /// The built-in registry: shared letterhead plus the three standard
    /// document kinds. The roster is built on the landscape base so its
    /// footer band follows the shorter page.
    pub fn standard() -> Self {
        let portrait = base_layout(PageSize::letter());
        let landscape = base_layout(PageSize::landscape_letter());
        Self::from_layouts(vec![
            (
                DocumentKind::EligibilityCertificate,
                portrait.merged(&certificate_overlay()),
            ),
            (
                DocumentKind::IneligibilityNotice,
                portrait.merged(&notice_overlay()),
            ),
            (
                DocumentKind::BoardRoster,
                landscape.merged(&roster_overlay(&landscape.page)),
            ),
        ])
    }
}

fn literal(text: &str) -> TextContent {
    TextContent::Literal {
        text: text.to_string(),
    }
}

fn keyed(key: &str) -> TextContent {
    TextContent::ContentKey {
        key: key.to_string(),
    }
}

/// Shared structure: control banner, title band, letterhead rule, unit
/// block, footer rule and disclaimer. The footer band is anchored to the
/// bottom edge so portrait and landscape pages share one definition.
fn base_layout(page: PageSize) -> DocumentLayout {
    let body_width = page.width - 108.0;
    DocumentLayout {
        page,
        regions: vec![
            StaticRegion::Text {
                x: page.width / 2.0 - 126.0,
                y: 30.0,
                size: 10.0,
                bold: true,
                content: literal("CUI// CONTROLLED UNCLASSIFIED INFORMATION"),
            },
            StaticRegion::Text {
                x: 54.0,
                y: 80.0,
                size: 16.0,
                bold: true,
                content: keyed("title"),
            },
            StaticRegion::Line {
                x: 54.0,
                y: 96.0,
                width: body_width,
            },
            StaticRegion::Text {
                x: 54.0,
                y: 120.0,
                size: 10.0,
                bold: false,
                content: keyed("unit"),
            },
            StaticRegion::Line {
                x: 54.0,
                y: page.height - 68.0,
                width: body_width,
            },
            StaticRegion::Text {
                x: 54.0,
                y: page.height - 48.0,
                size: 7.0,
                bold: false,
                content: literal(
                    "The information herein must be protected under the Freedom of \
                     Information Act (5 U.S.C. 552) and/or the Privacy Act of 1974 \
                     (5 U.S.C. 552a).",
                ),
            },
            StaticRegion::Text {
                x: 54.0,
                y: page.height - 28.0,
                size: 9.0,
                bold: false,
                content: keyed("accounting_date"),
            },
        ],
        fields: vec![],
    }
}

fn certificate_overlay() -> LayoutOverlay {
    LayoutOverlay {
        page: None,
        regions: vec![
            StaticRegion::Text {
                x: 54.0,
                y: 170.0,
                size: 11.0,
                bold: true,
                content: literal("Promotion Eligibility Determination"),
            },
            StaticRegion::Frame {
                x: 48.0,
                y: 186.0,
                width: 516.0,
                height: 150.0,
            },
        ],
        fields: vec![
            FieldSpec {
                name: "entity_id".to_string(),
                rect: LogicalRect {
                    x: 60.0,
                    y: 200.0,
                    width: 220.0,
                    height: 18.0,
                },
                binding: FieldBinding::EntityId,
            },
            FieldSpec {
                name: "cycle_id".to_string(),
                rect: LogicalRect {
                    x: 300.0,
                    y: 200.0,
                    width: 90.0,
                    height: 18.0,
                },
                binding: FieldBinding::CycleId,
            },
            FieldSpec {
                name: "eligibility".to_string(),
                rect: LogicalRect {
                    x: 60.0,
                    y: 232.0,
                    width: 150.0,
                    height: 18.0,
                },
                binding: FieldBinding::Eligible,
            },
            FieldSpec {
                name: "reason".to_string(),
                rect: LogicalRect {
                    x: 60.0,
                    y: 264.0,
                    width: 330.0,
                    height: 18.0,
                },
                binding: FieldBinding::ReasonCode,
            },
            FieldSpec {
                name: "evaluated_at".to_string(),
                rect: LogicalRect {
                    x: 60.0,
                    y: 296.0,
                    width: 120.0,
                    height: 18.0,
                },
                binding: FieldBinding::EvaluatedAt,
            },
            FieldSpec {
                name: "source_rule".to_string(),
                rect: LogicalRect {
                    x: 300.0,
                    y: 296.0,
                    width: 180.0,
                    height: 18.0,
                },
                binding: FieldBinding::SourceRuleId,
            },
        ],
    }
}

fn notice_overlay() -> LayoutOverlay {
    let mut overlay = certificate_overlay();
    overlay.regions[0] = StaticRegion::Text {
        x: 54.0,
        y: 170.0,
        size: 11.0,
        bold: true,
        content: literal("Notice of Promotion Ineligibility"),
    };
    overlay
}

fn roster_overlay(page: &PageSize) -> LayoutOverlay {
    LayoutOverlay {
        page: None,
        regions: vec![
            StaticRegion::Text {
                x: 54.0,
                y: 150.0,
                size: 10.0,
                bold: true,
                content: literal("MEMBER ID    CYCLE    STATUS    REASON"),
            },
            StaticRegion::Line {
                x: 54.0,
                y: 156.0,
                width: page.width - 108.0,
            },
            StaticRegion::TableRows {
                x: 54.0,
                y: 172.0,
                row_height: 16.0,
                size: 9.0,
                key_prefix: "row_".to_string(),
                // Rows stop above the footer band; overflow paginates.
                max_y: page.height - 78.0,
            },
        ],
        fields: vec![
            FieldSpec {
                name: "cycle_id".to_string(),
                rect: LogicalRect {
                    x: 620.0,
                    y: 80.0,
                    width: 90.0,
                    height: 16.0,
                },
                binding: FieldBinding::CycleId,
            },
            FieldSpec {
                name: "evaluated_at".to_string(),
                rect: LogicalRect {
                    x: 620.0,
                    y: 104.0,
                    width: 110.0,
                    height: 16.0,
                },
                binding: FieldBinding::EvaluatedAt,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_standard_registry_knows_all_kinds() {
        let registry = LayoutRegistry::standard();
        for kind in [
            DocumentKind::EligibilityCertificate,
            DocumentKind::IneligibilityNotice,
            DocumentKind::BoardRoster,
        ] {
            assert!(registry.layout_for(kind).is_ok(), "missing {kind}");
        }
    }

    #[test]
    fn test_partial_registry_reports_unknown_kind() {
        let registry = LayoutRegistry::from_overlays(base_layout(PageSize::letter()), vec![]);
        assert!(matches!(
            registry.layout_for(DocumentKind::BoardRoster),
            Err(RosterPdfError::UnknownDocumentKind(_))
        ));
    }

    #[test]
    fn test_overlay_replaces_field_with_same_name() {
        let base = DocumentLayout {
            page: PageSize::letter(),
            regions: vec![],
            fields: vec![FieldSpec {
                name: "entity_id".to_string(),
                rect: LogicalRect {
                    x: 10.0,
                    y: 10.0,
                    width: 100.0,
                    height: 15.0,
                },
                binding: FieldBinding::EntityId,
            }],
        };
        let overlay = LayoutOverlay {
            page: None,
            regions: vec![],
            fields: vec![FieldSpec {
                name: "entity_id".to_string(),
                rect: LogicalRect {
                    x: 50.0,
                    y: 50.0,
                    width: 100.0,
                    height: 15.0,
                },
                binding: FieldBinding::EntityId,
            }],
        };
        let merged = base.merged(&overlay);
        assert_eq!(merged.fields.len(), 1);
        assert_eq!(merged.fields[0].rect.x, 50.0);
    }

    #[test]
    fn test_roster_layout_is_landscape() {
        let registry = LayoutRegistry::standard();
        let roster = registry.layout_for(DocumentKind::BoardRoster).unwrap();
        assert_eq!(roster.page, PageSize::landscape_letter());
        let certificate = registry
            .layout_for(DocumentKind::EligibilityCertificate)
            .unwrap();
        assert_eq!(certificate.page, PageSize::letter());
    }

    #[test]
    fn test_roster_base_regions_fit_the_landscape_page() {
        let registry = LayoutRegistry::standard();
        let roster = registry.layout_for(DocumentKind::BoardRoster).unwrap();
        for region in &roster.regions {
            let y = match region {
                StaticRegion::Text { y, .. }
                | StaticRegion::Line { y, .. }
                | StaticRegion::Frame { y, .. } => *y,
                StaticRegion::TableRows { max_y, .. } => *max_y,
            };
            assert!(y < roster.page.height, "region at y {y} is off the page");
        }
    }

    #[test]
    fn test_layout_round_trips_through_json() {
        let registry = LayoutRegistry::standard();
        let layout = registry
            .layout_for(DocumentKind::EligibilityCertificate)
            .unwrap();
        let json = serde_json::to_string(layout).unwrap();
        let back: DocumentLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, layout);
    }
}

//! Roster and certificate document generation.
//!
//! A [`DocumentLayout`](layout::DocumentLayout) describes a page in
//! logical top-left coordinates. [`render_base`](render::render_base)
//! draws the static regions into a single-page PDF,
//! [`inject_fields`](inject::inject_fields) adds interactive text
//! widgets bound to a decision, and [`merge_rendered`](merge::merge_rendered)
//! concatenates per-record documents into one buffer.

pub mod error;
pub mod inject;
pub mod layout;
pub mod merge;
pub mod render;

pub use error::RosterPdfError;
pub use inject::{inject_fields, to_pdf_space, PdfRect};
pub use layout::{
    DocumentKind, DocumentLayout, FieldBinding, FieldSpec, LayoutOverlay, LayoutRegistry,
    LogicalRect, PageSize, StaticRegion, TextContent,
};
pub use merge::merge_rendered;
pub use render::{render_base, StaticContent};

/// A generated PDF plus the names of the interactive fields written so far.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub applied_fields: Vec<String>,
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RosterPdfError {
    #[error("unknown document kind: {0}")]
    UnknownDocumentKind(String),

    #[error("field `{name}` falls outside the page after transform (x={x}, y={y}, w={width}, h={height})")]
    FieldPlacement {
        name: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    #[error("failed to parse PDF: {0}")]
    Parse(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),
}

impl RosterPdfError {
    /// Stable machine-readable tag for failure reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            RosterPdfError::UnknownDocumentKind(_) => "unknown_document_kind",
            RosterPdfError::FieldPlacement { .. } => "field_placement",
            RosterPdfError::Parse(_) => "parse",
            RosterPdfError::Operation(_) => "operation",
        }
    }
}

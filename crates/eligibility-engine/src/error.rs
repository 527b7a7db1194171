use shared_types::{Stage, UnparseableDate};
use thiserror::Error;

/// Batch-fatal errors. These indicate a misconfigured table, not a bad
/// record, and propagate immediately.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown promotion cycle: {0}")]
    UnknownCycle(String),

    #[error("invalid rule configuration: {0}")]
    InvalidConfig(String),
}

/// Structural problems with a single record. A predicate that merely
/// evaluates false is NOT an error; ineligible is a valid decision.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("missing required field `{field}`")]
    MissingField { field: String },

    #[error("field `{field}` has the wrong type (expected {expected})")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },

    #[error("field `{field}`: {source}")]
    UnparseableDate {
        field: String,
        source: UnparseableDate,
    },
}

impl EvaluationError {
    /// The pipeline stage this failure belongs to in a batch report.
    pub fn stage(&self) -> Stage {
        match self {
            EvaluationError::UnparseableDate { .. } => Stage::Normalize,
            _ => Stage::Evaluate,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EvaluationError::MissingField { .. } => "missing_field",
            EvaluationError::TypeMismatch { .. } => "type_mismatch",
            EvaluationError::UnparseableDate { .. } => "unparseable_date",
        }
    }
}

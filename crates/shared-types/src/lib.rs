pub mod date;
pub mod types;

pub use date::{CanonicalDate, UnparseableDate};
pub use types::{
    BatchOutcome, Condition, Decision, EntityRecord, FailureRecord, FieldValue, Outcome,
    ReasonCode, Rule, Stage,
};

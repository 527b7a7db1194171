//! Domain data model for eligibility evaluation and roster documents.

use crate::date::CanonicalDate;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A raw attribute value as ingested from a roster source.
///
/// Date-bearing attributes may arrive in any of the recognized raw shapes
/// (`Text`, `Number`, `Date`, `Timestamp`); the temporal normalizer is the
/// single place that turns them into a [`CanonicalDate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FieldValue {
    Text { value: String },
    Number { value: f64 },
    Flag { value: bool },
    Date { value: NaiveDate },
    Timestamp { value: NaiveDateTime },
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    pub fn number(value: f64) -> Self {
        Self::Number { value }
    }

    pub fn flag(value: bool) -> Self {
        Self::Flag { value }
    }
}

/// One entity (person/account) as handed to the evaluator.
///
/// Immutable once ingested; the caller owns it and the engine only reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl EntityRecord {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// A typed predicate over one record field.
///
/// Conditions within a rule combine with AND semantics; rules within a
/// cycle combine with OR semantics, evaluated in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Condition {
    /// Numeric value within `[min, max]`; open ends are unconstrained.
    NumberInRange {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Exact value equality.
    Equals { field: String, value: FieldValue },
    /// Text value member of a set.
    OneOf { field: String, values: Vec<String> },
    /// Text value NOT a member of a set.
    NoneOf { field: String, values: Vec<String> },
    /// Normalized date on or before the anchor.
    DateOnOrBefore { field: String, date: CanonicalDate },
    /// Normalized date on or after the anchor.
    DateOnOrAfter { field: String, date: CanonicalDate },
}

impl Condition {
    /// The record field this condition reads.
    pub fn field(&self) -> &str {
        match self {
            Condition::NumberInRange { field, .. }
            | Condition::Equals { field, .. }
            | Condition::OneOf { field, .. }
            | Condition::NoneOf { field, .. }
            | Condition::DateOnOrBefore { field, .. }
            | Condition::DateOnOrAfter { field, .. } => field,
        }
    }
}

/// Why an entity is (in)eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonCode {
    FullyQualified,
    TimeInGrade,
    TimeInService,
    HighYearTenure,
    ReenlistmentCode,
    SkillLevel,
    UnfavorableInformationFile,
    NoRuleMatched,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::FullyQualified => "fully qualified",
            ReasonCode::TimeInGrade => "insufficient time in grade",
            ReasonCode::TimeInService => "insufficient time in service",
            ReasonCode::HighYearTenure => "exceeds high year tenure",
            ReasonCode::ReenlistmentCode => "disqualifying reenlistment code",
            ReasonCode::SkillLevel => "insufficient skill level",
            ReasonCode::UnfavorableInformationFile => "unfavorable information file",
            ReasonCode::NoRuleMatched => "no rule matched",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome a matching rule assigns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub eligible: bool,
    pub reason_code: ReasonCode,
}

/// One eligibility rule for a promotion cycle.
///
/// Lower `priority` numbers are consulted first; the first rule whose
/// conditions all hold decides the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: String,
    pub cycle_id: String,
    pub priority: u32,
    pub conditions: Vec<Condition>,
    pub outcome: Outcome,
}

/// The evaluator's verdict for one record. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub entity_id: String,
    pub cycle_id: String,
    pub eligible: bool,
    pub reason_code: ReasonCode,
    pub evaluated_at: CanonicalDate,
    /// Absent when no rule matched and the default outcome applied.
    pub source_rule_id: Option<String>,
}

/// Pipeline stage at which a record failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Normalize,
    Evaluate,
    Render,
    Inject,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Normalize => "normalize",
            Stage::Evaluate => "evaluate",
            Stage::Render => "render",
            Stage::Inject => "inject",
        };
        f.write_str(name)
    }
}

/// One per-record failure captured during a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub entity_id: String,
    pub stage: Stage,
    pub kind: String,
    pub detail: String,
}

/// Result of evaluating a whole batch: every record ends up in exactly
/// one of the two sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub decisions: Vec<Decision>,
    pub failures: Vec<FailureRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_condition_deserializes_from_tagged_json() {
        let json = r#"{"type":"OneOf","field":"re_status","values":["2A","2B"]}"#;
        let cond: Condition = serde_json::from_str(json).unwrap();
        assert_eq!(
            cond,
            Condition::OneOf {
                field: "re_status".to_string(),
                values: vec!["2A".to_string(), "2B".to_string()],
            }
        );
    }

    #[test]
    fn test_record_builder_keeps_fields() {
        let record = EntityRecord::new("1234")
            .with_field("grade", FieldValue::text("SSG"))
            .with_field("uif", FieldValue::flag(false));
        assert_eq!(record.field("grade"), Some(&FieldValue::text("SSG")));
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn test_decision_round_trips_through_json() {
        let decision = Decision {
            entity_id: "1234".to_string(),
            cycle_id: "E6".to_string(),
            eligible: false,
            reason_code: ReasonCode::TimeInGrade,
            evaluated_at: CanonicalDate::from_ymd(2025, 1, 31).unwrap(),
            source_rule_id: Some("e6-tig".to_string()),
        };
        let json = serde_json::to_string(&decision).unwrap();
        let back: Decision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, decision);
    }
}

//! Conversion between Decision batches and JSON primitive trees.
//!
//! The session layer only stores strings, numbers, booleans, and nulls.
//! `sanitize` maps every non-primitive domain value to a fixed primitive
//! encoding (dates as `YYYY-MM-DD` strings, reason codes as tokens) and
//! `desanitize` is its exact inverse.

use crate::error::SessionStoreError;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use shared_types::{CanonicalDate, Decision, ReasonCode};

const DATE_FORMAT: &str = "%Y-%m-%d";

const ALL_REASONS: [ReasonCode; 8] = [
    ReasonCode::FullyQualified,
    ReasonCode::TimeInGrade,
    ReasonCode::TimeInService,
    ReasonCode::HighYearTenure,
    ReasonCode::ReenlistmentCode,
    ReasonCode::SkillLevel,
    ReasonCode::UnfavorableInformationFile,
    ReasonCode::NoRuleMatched,
];

/// The single source of the token encoding; exhaustive so adding a
/// variant without a token fails to compile.
fn reason_token(code: ReasonCode) -> &'static str {
    match code {
        ReasonCode::FullyQualified => "fully_qualified",
        ReasonCode::TimeInGrade => "time_in_grade",
        ReasonCode::TimeInService => "time_in_service",
        ReasonCode::HighYearTenure => "high_year_tenure",
        ReasonCode::ReenlistmentCode => "reenlistment_code",
        ReasonCode::SkillLevel => "skill_level",
        ReasonCode::UnfavorableInformationFile => "unfavorable_information_file",
        ReasonCode::NoRuleMatched => "no_rule_matched",
    }
}

fn reason_from_token(token: &str) -> Result<ReasonCode, SessionStoreError> {
    ALL_REASONS
        .into_iter()
        .find(|code| reason_token(*code) == token)
        .ok_or_else(|| SessionStoreError::UnknownReasonCode(token.to_string()))
}

fn date_string(date: &CanonicalDate) -> String {
    date.as_naive().format(DATE_FORMAT).to_string()
}

fn date_from_string(raw: &str) -> Result<CanonicalDate, SessionStoreError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(CanonicalDate::new)
        .map_err(|_| SessionStoreError::UnparseableDate(raw.to_string()))
}

/// Encode a Decision batch as a JSON array of flat primitive objects.
pub fn sanitize(decisions: &[Decision]) -> Value {
    Value::Array(decisions.iter().map(sanitize_decision).collect())
}

fn sanitize_decision(decision: &Decision) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "entity_id".to_string(),
        Value::String(decision.entity_id.clone()),
    );
    obj.insert(
        "cycle_id".to_string(),
        Value::String(decision.cycle_id.clone()),
    );
    obj.insert("eligible".to_string(), Value::Bool(decision.eligible));
    obj.insert(
        "reason_code".to_string(),
        Value::String(reason_token(decision.reason_code).to_string()),
    );
    obj.insert(
        "evaluated_at".to_string(),
        Value::String(date_string(&decision.evaluated_at)),
    );
    obj.insert(
        "source_rule_id".to_string(),
        match &decision.source_rule_id {
            Some(id) => Value::String(id.clone()),
            None => Value::Null,
        },
    );
    Value::Object(obj)
}

/// Decode a primitive tree produced by [`sanitize`] back into Decisions.
pub fn desanitize(value: &Value) -> Result<Vec<Decision>, SessionStoreError> {
    let items = value
        .as_array()
        .ok_or_else(|| SessionStoreError::Malformed("expected an array".to_string()))?;
    items.iter().map(desanitize_decision).collect()
}

fn desanitize_decision(value: &Value) -> Result<Decision, SessionStoreError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SessionStoreError::Malformed("expected an object".to_string()))?;

    let source_rule_id = match obj.get("source_rule_id") {
        Some(Value::Null) | None => None,
        Some(Value::String(id)) => Some(id.clone()),
        Some(other) => {
            return Err(SessionStoreError::Malformed(format!(
                "source_rule_id must be string or null, got {other}"
            )))
        }
    };

    Ok(Decision {
        entity_id: require_string(obj, "entity_id")?,
        cycle_id: require_string(obj, "cycle_id")?,
        eligible: obj
            .get("eligible")
            .and_then(Value::as_bool)
            .ok_or_else(|| SessionStoreError::Malformed("missing bool 'eligible'".to_string()))?,
        reason_code: reason_from_token(&require_string(obj, "reason_code")?)?,
        evaluated_at: date_from_string(&require_string(obj, "evaluated_at")?)?,
        source_rule_id,
    })
}

fn require_string(obj: &Map<String, Value>, key: &str) -> Result<String, SessionStoreError> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SessionStoreError::Malformed(format!("missing string '{key}'")))
}

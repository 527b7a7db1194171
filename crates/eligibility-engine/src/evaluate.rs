//! Applies a cycle's rules to one normalized record.

use crate::error::EvaluationError;
use crate::temporal;
use shared_types::{CanonicalDate, Condition, Decision, EntityRecord, FieldValue, ReasonCode, Rule};

/// Evaluate one record against a cycle's rules (already in priority
/// order). The first rule whose conditions all hold decides the outcome;
/// a record matching no rule gets an explicit ineligible decision with
/// [`ReasonCode::NoRuleMatched`].
///
/// `evaluated_at` is an input, captured once by the caller; evaluation
/// itself never consults the wall clock, so identical inputs always
/// produce identical decisions.
pub fn evaluate(
    record: &EntityRecord,
    rules: &[Rule],
    cycle_id: &str,
    evaluated_at: CanonicalDate,
) -> Result<Decision, EvaluationError> {
    for rule in rules {
        if rule_matches(record, rule)? {
            return Ok(Decision {
                entity_id: record.entity_id.clone(),
                cycle_id: cycle_id.to_string(),
                eligible: rule.outcome.eligible,
                reason_code: rule.outcome.reason_code,
                evaluated_at,
                source_rule_id: Some(rule.rule_id.clone()),
            });
        }
    }

    Ok(Decision {
        entity_id: record.entity_id.clone(),
        cycle_id: cycle_id.to_string(),
        eligible: false,
        reason_code: ReasonCode::NoRuleMatched,
        evaluated_at,
        source_rule_id: None,
    })
}

fn rule_matches(record: &EntityRecord, rule: &Rule) -> Result<bool, EvaluationError> {
    for condition in &rule.conditions {
        if !condition_holds(record, condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn condition_holds(record: &EntityRecord, condition: &Condition) -> Result<bool, EvaluationError> {
    let field = condition.field();
    let value = record
        .field(field)
        .ok_or_else(|| EvaluationError::MissingField {
            field: field.to_string(),
        })?;

    match condition {
        Condition::NumberInRange { min, max, .. } => {
            let n = as_number(field, value)?;
            Ok(min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi))
        }
        Condition::Equals { value: expected, .. } => Ok(value == expected),
        Condition::OneOf { values, .. } => {
            let text = as_text(field, value)?;
            Ok(values.iter().any(|v| v == text))
        }
        Condition::NoneOf { values, .. } => {
            let text = as_text(field, value)?;
            Ok(!values.iter().any(|v| v == text))
        }
        Condition::DateOnOrBefore { date, .. } => {
            Ok(normalize_field(field, value)? <= *date)
        }
        Condition::DateOnOrAfter { date, .. } => {
            Ok(normalize_field(field, value)? >= *date)
        }
    }
}

fn as_number(field: &str, value: &FieldValue) -> Result<f64, EvaluationError> {
    match value {
        FieldValue::Number { value } => Ok(*value),
        _ => Err(EvaluationError::TypeMismatch {
            field: field.to_string(),
            expected: "number",
        }),
    }
}

fn as_text<'a>(field: &str, value: &'a FieldValue) -> Result<&'a str, EvaluationError> {
    match value {
        FieldValue::Text { value } => Ok(value),
        _ => Err(EvaluationError::TypeMismatch {
            field: field.to_string(),
            expected: "text",
        }),
    }
}

fn normalize_field(field: &str, value: &FieldValue) -> Result<CanonicalDate, EvaluationError> {
    temporal::normalize(value).map_err(|source| EvaluationError::UnparseableDate {
        field: field.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::{Outcome, Stage};

    fn clock() -> CanonicalDate {
        CanonicalDate::from_ymd(2024, 6, 1).unwrap()
    }

    fn rule(rule_id: &str, priority: u32, conditions: Vec<Condition>, eligible: bool) -> Rule {
        Rule {
            rule_id: rule_id.to_string(),
            cycle_id: "E6".to_string(),
            priority,
            conditions,
            outcome: Outcome {
                eligible,
                reason_code: if eligible {
                    ReasonCode::FullyQualified
                } else {
                    ReasonCode::ReenlistmentCode
                },
            },
        }
    }

    fn re_rule() -> Rule {
        rule(
            "e6-re-code",
            10,
            vec![Condition::OneOf {
                field: "re_status".to_string(),
                values: vec!["2A".to_string(), "4H".to_string()],
            }],
            false,
        )
    }

    fn catch_all() -> Rule {
        rule("e6-qualified", 100, vec![], true)
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![re_rule(), catch_all()];
        let record = EntityRecord::new("a1").with_field("re_status", FieldValue::text("4H"));

        let decision = evaluate(&record, &rules, "E6", clock()).unwrap();
        assert!(!decision.eligible);
        assert_eq!(decision.reason_code, ReasonCode::ReenlistmentCode);
        assert_eq!(decision.source_rule_id.as_deref(), Some("e6-re-code"));
    }

    #[test]
    fn test_false_predicate_is_not_a_failure() {
        let rules = vec![re_rule(), catch_all()];
        let record = EntityRecord::new("a1").with_field("re_status", FieldValue::text("1A"));

        let decision = evaluate(&record, &rules, "E6", clock()).unwrap();
        assert!(decision.eligible);
        assert_eq!(decision.reason_code, ReasonCode::FullyQualified);
    }

    #[test]
    fn test_no_rule_matched_is_explicit_ineligible() {
        let rules = vec![re_rule()];
        let record = EntityRecord::new("a1").with_field("re_status", FieldValue::text("1A"));

        let decision = evaluate(&record, &rules, "E6", clock()).unwrap();
        assert!(!decision.eligible);
        assert_eq!(decision.reason_code, ReasonCode::NoRuleMatched);
        assert_eq!(decision.source_rule_id, None);
    }

    #[test]
    fn test_missing_field_is_structural_failure() {
        let rules = vec![re_rule(), catch_all()];
        let record = EntityRecord::new("a1");

        let err = evaluate(&record, &rules, "E6", clock()).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::MissingField {
                field: "re_status".to_string()
            }
        );
        assert_eq!(err.stage(), Stage::Evaluate);
    }

    #[test]
    fn test_bad_date_maps_to_normalize_stage() {
        let rules = vec![rule(
            "e6-tig",
            30,
            vec![Condition::DateOnOrAfter {
                field: "date_of_rank".to_string(),
                date: clock(),
            }],
            false,
        )];
        let record =
            EntityRecord::new("a1").with_field("date_of_rank", FieldValue::text("not a date"));

        let err = evaluate(&record, &rules, "E6", clock()).unwrap_err();
        assert_eq!(err.stage(), Stage::Normalize);
        assert_eq!(err.kind(), "unparseable_date");
    }

    #[test]
    fn test_date_boundaries_are_inclusive() {
        let anchor = CanonicalDate::from_ymd(2022, 9, 1).unwrap();
        let record = EntityRecord::new("a1")
            .with_field("date_of_rank", FieldValue::text("01-Sep-2022"));

        let on_or_before = Condition::DateOnOrBefore {
            field: "date_of_rank".to_string(),
            date: anchor,
        };
        let on_or_after = Condition::DateOnOrAfter {
            field: "date_of_rank".to_string(),
            date: anchor,
        };
        assert!(condition_holds(&record, &on_or_before).unwrap());
        assert!(condition_holds(&record, &on_or_after).unwrap());
    }

    #[test]
    fn test_open_ended_range() {
        let record = EntityRecord::new("a1").with_field("score", FieldValue::number(42.0));
        let at_least_10 = Condition::NumberInRange {
            field: "score".to_string(),
            min: Some(10.0),
            max: None,
        };
        assert!(condition_holds(&record, &at_least_10).unwrap());
    }

    #[test]
    fn test_determinism_for_fixed_inputs() {
        let rules = vec![re_rule(), catch_all()];
        let record = EntityRecord::new("a1").with_field("re_status", FieldValue::text("2A"));

        let first = evaluate(&record, &rules, "E6", clock()).unwrap();
        let second = evaluate(&record, &rules, "E6", clock()).unwrap();
        assert_eq!(first, second);
    }
}

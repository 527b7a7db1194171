//! Data-driven promotion eligibility engine.
//!
//! Raw records flow through the temporal normalizer into the evaluator,
//! which consults an immutable rule table. Per-record failures are
//! captured in a batch report and never abort the rest of the batch.

pub mod cycles;
pub mod error;
pub mod evaluate;
pub mod report;
pub mod rules;
pub mod temporal;

pub use cycles::builtin_table;
pub use error::{EngineError, EvaluationError};
pub use report::BatchReport;
pub use rules::{RuleTable, RuleTableConfig};

use shared_types::{BatchOutcome, CanonicalDate, EntityRecord, FailureRecord};

/// EligibilityEngine entry point.
///
/// Holds one immutable rule-table snapshot; concurrent evaluations share
/// it read-only. Changing rules means constructing a new engine.
pub struct EligibilityEngine {
    table: RuleTable,
}

impl EligibilityEngine {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Evaluate every record against one cycle's rules.
    ///
    /// `evaluated_at` is captured once for the whole call and stamped on
    /// every decision. An unknown cycle is fatal; a bad record only lands
    /// in the failure sequence.
    pub fn evaluate_batch(
        &self,
        records: &[EntityRecord],
        cycle_id: &str,
        evaluated_at: CanonicalDate,
    ) -> Result<BatchOutcome, EngineError> {
        let rules = self.table.rules_for(cycle_id)?;
        let report = BatchReport::new();
        let mut decisions = Vec::with_capacity(records.len());

        for record in records {
            match evaluate::evaluate(record, rules, cycle_id, evaluated_at) {
                Ok(decision) => decisions.push(decision),
                Err(err) => {
                    tracing::warn!(
                        entity_id = %record.entity_id,
                        stage = %err.stage(),
                        "record failed evaluation: {err}"
                    );
                    report.record(FailureRecord {
                        entity_id: record.entity_id.clone(),
                        stage: err.stage(),
                        kind: err.kind().to_string(),
                        detail: err.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            cycle_id,
            decisions = decisions.len(),
            failures = report.snapshot().len(),
            "batch evaluated"
        );

        Ok(BatchOutcome {
            decisions,
            failures: report.into_failures(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::{FieldValue, ReasonCode, Stage};

    fn clock() -> CanonicalDate {
        CanonicalDate::from_ymd(2024, 6, 1).unwrap()
    }

    fn qualified_record(id: &str) -> EntityRecord {
        EntityRecord::new(id)
            .with_field("re_status", FieldValue::text("1A"))
            .with_field("uif", FieldValue::flag(false))
            .with_field("date_of_rank", FieldValue::text("01-Mar-2019"))
            .with_field("tafmsd", FieldValue::text("15-Jun-2010"))
            .with_field("pafsc_skill_level", FieldValue::text("7"))
    }

    #[test]
    fn test_unknown_cycle_is_fatal() {
        let engine = EligibilityEngine::new(builtin_table(2024).unwrap());
        let result = engine.evaluate_batch(&[qualified_record("a1")], "O-6", clock());
        assert!(matches!(result, Err(EngineError::UnknownCycle(_))));
    }

    #[test]
    fn test_qualified_member_is_eligible() {
        let engine = EligibilityEngine::new(builtin_table(2024).unwrap());
        let outcome = engine
            .evaluate_batch(&[qualified_record("a1")], "E6", clock())
            .unwrap();
        assert_eq!(outcome.failures, vec![]);
        assert!(outcome.decisions[0].eligible);
        assert_eq!(outcome.decisions[0].reason_code, ReasonCode::FullyQualified);
    }

    #[test]
    fn test_tenure_exemption_window() {
        let engine = EligibilityEngine::new(builtin_table(2024).unwrap());

        // Service since 2003: standard tenure date fell before the
        // exemption window opened, so the member is out.
        let over = {
            let mut r = qualified_record("over");
            r.fields
                .insert("tafmsd".to_string(), FieldValue::text("15-Jan-2003"));
            r
        };
        // Service since mid-2004: tenure date lands inside the window and
        // the extended limit applies.
        let exempt = {
            let mut r = qualified_record("exempt");
            r.fields
                .insert("tafmsd".to_string(), FieldValue::text("15-Jun-2004"));
            r
        };

        let outcome = engine
            .evaluate_batch(&[over, exempt], "E6", clock())
            .unwrap();
        assert_eq!(outcome.decisions.len(), 2);
        assert!(!outcome.decisions[0].eligible);
        assert_eq!(
            outcome.decisions[0].reason_code,
            ReasonCode::HighYearTenure
        );
        assert!(outcome.decisions[1].eligible);
    }

    #[test]
    fn test_one_bad_record_does_not_abort_batch() {
        let engine = EligibilityEngine::new(builtin_table(2024).unwrap());

        let mut records: Vec<EntityRecord> =
            (0..10).map(|i| qualified_record(&format!("m{i}"))).collect();
        records[3]
            .fields
            .insert("date_of_rank".to_string(), FieldValue::text("garbage"));

        let outcome = engine.evaluate_batch(&records, "E6", clock()).unwrap();
        assert_eq!(outcome.decisions.len(), 9);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].entity_id, "m3");
        assert_eq!(outcome.failures[0].stage, Stage::Normalize);
    }

    #[test]
    fn test_decisions_carry_the_supplied_clock() {
        let engine = EligibilityEngine::new(builtin_table(2024).unwrap());
        let stamp = CanonicalDate::from_ymd(2024, 2, 29).unwrap();
        let outcome = engine
            .evaluate_batch(&[qualified_record("a1")], "E5", stamp)
            .unwrap();
        assert_eq!(outcome.decisions[0].evaluated_at, stamp);
    }
}

//! Per-batch failure aggregation.
//!
//! Each batch owns its own report; nothing is shared across batches.
//! Appends are synchronized so workers evaluating records in parallel can
//! funnel failures into one sink without interleaving.

use shared_types::FailureRecord;
use std::sync::Mutex;

/// Append-only failure sink for the lifetime of one batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    failures: Mutex<Vec<FailureRecord>>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure. Never fails; a poisoned lock (a worker panic
    /// mid-append cannot corrupt a Vec push) still yields the data.
    pub fn record(&self, failure: FailureRecord) {
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        failures.push(failure);
    }

    /// Point-in-time copy of everything recorded so far, in append order.
    pub fn snapshot(&self) -> Vec<FailureRecord> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }

    /// Consume the report at the end of the batch.
    pub fn into_failures(self) -> Vec<FailureRecord> {
        self.failures
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::Stage;

    fn failure(entity_id: &str) -> FailureRecord {
        FailureRecord {
            entity_id: entity_id.to_string(),
            stage: Stage::Normalize,
            kind: "unparseable_date".to_string(),
            detail: "bad input".to_string(),
        }
    }

    #[test]
    fn test_append_order_preserved() {
        let report = BatchReport::new();
        report.record(failure("a"));
        report.record(failure("b"));
        report.record(failure("c"));

        let snapshot = report.snapshot();
        let ids: Vec<&str> = snapshot.iter().map(|f| f.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let report = BatchReport::new();
        report.record(failure("a"));
        let snap = report.snapshot();
        report.record(failure("b"));

        assert_eq!(snap.len(), 1);
        assert_eq!(report.snapshot().len(), 2);
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        use std::sync::Arc;

        let report = Arc::new(BatchReport::new());
        let mut handles = Vec::new();
        for worker in 0..4 {
            let report = Arc::clone(&report);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    report.record(failure(&format!("w{worker}-{i}")));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let failures = report.snapshot();
        assert_eq!(failures.len(), 200);
        // Every record arrived intact.
        for f in &failures {
            assert!(f.entity_id.starts_with('w'));
            assert_eq!(f.kind, "unparseable_date");
        }
    }
}

//! Facade over the promotion-eligibility pipeline.
//!
//! Ties the three engines together: evaluate a batch of records against
//! a cycle's rule table, generate the finished documents for the
//! resulting decisions, and persist evaluated batches across requests
//! through the session sanitizer/store.

pub mod error;

pub use error::CoreError;
pub use eligibility_engine::{builtin_table, EligibilityEngine, EngineError, RuleTable};
pub use roster_pdf::{DocumentKind, LayoutRegistry, RenderedDocument};
pub use session_store::{SessionStore, DEFAULT_TTL_SECONDS};
pub use shared_types::{
    BatchOutcome, CanonicalDate, Decision, EntityRecord, FailureRecord, Stage,
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use roster_pdf::{inject_fields, merge_rendered, render_base, StaticContent};
use session_store::{desanitize, sanitize};

/// Everything the pipeline needs, assembled once at process start and
/// then shared immutably.
pub struct EngineConfig {
    pub table: RuleTable,
    pub layouts: LayoutRegistry,
    /// Letterhead unit line stamped on every document.
    pub unit_name: String,
    pub session_ttl_seconds: i64,
}

impl EngineConfig {
    /// Built-in cycle rules for one promotion year plus the standard
    /// document layouts.
    pub fn standard(year: i32, unit_name: impl Into<String>) -> Result<Self, EngineError> {
        Ok(Self {
            table: builtin_table(year)?,
            layouts: LayoutRegistry::standard(),
            unit_name: unit_name.into(),
            session_ttl_seconds: DEFAULT_TTL_SECONDS,
        })
    }

    /// Load the rule table from a declarative JSON file, keeping the
    /// standard layouts. Intended for process startup.
    pub fn from_rules_file(
        path: &std::path::Path,
        unit_name: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading rule table {}", path.display()))?;
        let table = RuleTable::from_json(&raw)
            .with_context(|| format!("parsing rule table {}", path.display()))?;
        Ok(Self {
            table,
            layouts: LayoutRegistry::standard(),
            unit_name: unit_name.into(),
            session_ttl_seconds: DEFAULT_TTL_SECONDS,
        })
    }
}

/// Evaluation plus document generation plus session persistence behind
/// one handle. The rule table and layouts are immutable after
/// construction; the session store is the only synchronized state.
pub struct PromotionPipeline {
    engine: EligibilityEngine,
    layouts: LayoutRegistry,
    unit_name: String,
    sessions: SessionStore,
}

impl PromotionPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: EligibilityEngine::new(config.table),
            layouts: config.layouts,
            unit_name: config.unit_name,
            sessions: SessionStore::with_ttl_seconds(config.session_ttl_seconds),
        }
    }

    /// Evaluate every record against one cycle. An unknown cycle is
    /// fatal; individual bad records land in the outcome's failures.
    pub fn evaluate_batch(
        &self,
        records: &[EntityRecord],
        cycle_id: &str,
        evaluated_at: CanonicalDate,
    ) -> Result<BatchOutcome, CoreError> {
        Ok(self.engine.evaluate_batch(records, cycle_id, evaluated_at)?)
    }

    /// The document kind a single decision calls for.
    pub fn document_kind_for(decision: &Decision) -> DocumentKind {
        if decision.eligible {
            DocumentKind::EligibilityCertificate
        } else {
            DocumentKind::IneligibilityNotice
        }
    }

    /// Render the base document for `kind` and inject the interactive
    /// fields valued from `decision`. Deterministic: the same inputs
    /// produce byte-identical output.
    pub fn generate_document(
        &self,
        decision: &Decision,
        kind: DocumentKind,
    ) -> Result<RenderedDocument, CoreError> {
        let layout = self.layouts.layout_for(kind)?;
        let content = self.static_content(decision, kind);
        let base = render_base(layout, &content)?;
        Ok(inject_fields(&base, layout, decision)?)
    }

    /// Generate one document per decision. An unknown kind is fatal;
    /// per-decision render or inject problems become FailureRecords and
    /// the rest of the batch continues.
    pub fn generate_documents(
        &self,
        decisions: &[Decision],
        kind: DocumentKind,
    ) -> Result<(Vec<RenderedDocument>, Vec<FailureRecord>), CoreError> {
        // Fail fast on an unregistered kind before touching any decision.
        let layout = self.layouts.layout_for(kind)?;

        let mut documents = Vec::with_capacity(decisions.len());
        let mut failures = Vec::new();
        for decision in decisions {
            let content = self.static_content(decision, kind);
            let rendered = render_base(layout, &content)
                .map_err(|e| (Stage::Render, e))
                .and_then(|base| {
                    inject_fields(&base, layout, decision).map_err(|e| (Stage::Inject, e))
                });
            match rendered {
                Ok(doc) => documents.push(doc),
                Err((stage, err)) => {
                    tracing::warn!(
                        entity_id = %decision.entity_id,
                        %stage,
                        "document generation failed: {err}"
                    );
                    failures.push(FailureRecord {
                        entity_id: decision.entity_id.clone(),
                        stage,
                        kind: err.kind().to_string(),
                        detail: err.to_string(),
                    });
                }
            }
        }
        Ok((documents, failures))
    }

    /// One deliverable buffer: a document per decision, merged in order.
    pub fn generate_packet(
        &self,
        decisions: &[Decision],
        kind: DocumentKind,
    ) -> Result<(RenderedDocument, Vec<FailureRecord>), CoreError> {
        let (documents, failures) = self.generate_documents(decisions, kind)?;
        if documents.is_empty() {
            return Err(CoreError::EmptyBatch("no documents to merge"));
        }
        Ok((merge_rendered(&documents)?, failures))
    }

    /// Single tabular roster covering the whole batch. Fields are valued
    /// from the first decision (cycle and clock are batch-wide).
    pub fn generate_roster(&self, decisions: &[Decision]) -> Result<RenderedDocument, CoreError> {
        let first = decisions
            .first()
            .ok_or(CoreError::EmptyBatch("no decisions for roster"))?;

        let layout = self.layouts.layout_for(DocumentKind::BoardRoster)?;
        let mut content = self.static_content(first, DocumentKind::BoardRoster);
        for (i, decision) in decisions.iter().enumerate() {
            let status = if decision.eligible {
                "ELIGIBLE"
            } else {
                "INELIGIBLE"
            };
            content.insert(
                format!("row_{i}"),
                format!(
                    "{}    {}    {}    {}",
                    decision.entity_id, decision.cycle_id, status, decision.reason_code
                ),
            );
        }

        let base = render_base(layout, &content)?;
        Ok(inject_fields(&base, layout, first)?)
    }

    /// Persist an evaluated batch under an opaque session id.
    pub fn store_batch(&self, session_id: &str, decisions: &[Decision], now: DateTime<Utc>) {
        self.sessions.put(session_id, sanitize(decisions), now);
    }

    /// Read a persisted batch back. Expired or unknown sessions read as
    /// `None`; a corrupted stored tree is an error.
    pub fn load_batch(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<Decision>>, CoreError> {
        match self.sessions.get(session_id, now) {
            Some(tree) => Ok(Some(desanitize(&tree)?)),
            None => Ok(None),
        }
    }

    fn static_content(&self, decision: &Decision, kind: DocumentKind) -> StaticContent {
        let title = match kind {
            DocumentKind::EligibilityCertificate => "PROMOTION ELIGIBILITY CERTIFICATE",
            DocumentKind::IneligibilityNotice => "NOTICE OF PROMOTION INELIGIBILITY",
            DocumentKind::BoardRoster => "PROMOTION BOARD ELIGIBILITY ROSTER",
        };
        StaticContent::from([
            ("title".to_string(), title.to_string()),
            ("unit".to_string(), self.unit_name.clone()),
            (
                "accounting_date".to_string(),
                format!("As of: {}", decision.evaluated_at),
            ),
        ])
    }
}

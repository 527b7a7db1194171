//! Immutable, versioned rule table.
//!
//! The table is loaded once at process start from a declarative source and
//! never mutated afterwards; swapping rules means building a new table.
//! Shared references are therefore safe across evaluation threads.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use shared_types::Rule;
use std::collections::BTreeMap;

/// Declarative rule-table definition, as deserialized from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTableConfig {
    pub version: String,
    pub rules: Vec<Rule>,
}

/// Read-only collection of eligibility rules keyed by promotion cycle.
#[derive(Debug, Clone)]
pub struct RuleTable {
    version: String,
    cycles: BTreeMap<String, Vec<Rule>>,
}

impl RuleTable {
    /// Build a table from loose rules. Within each cycle, rules are stored
    /// sorted by `(priority, rule_id)` so that evaluation order never
    /// depends on registration order; equal priorities tie-break on
    /// lexicographic rule id.
    pub fn from_rules(version: impl Into<String>, rules: Vec<Rule>) -> Self {
        let mut cycles: BTreeMap<String, Vec<Rule>> = BTreeMap::new();
        for rule in rules {
            cycles.entry(rule.cycle_id.clone()).or_default().push(rule);
        }
        for cycle_rules in cycles.values_mut() {
            cycle_rules.sort_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| a.rule_id.cmp(&b.rule_id))
            });
        }
        Self {
            version: version.into(),
            cycles,
        }
    }

    /// Parse a declarative JSON definition.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: RuleTableConfig =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        Ok(Self::from_rules(config.version, config.rules))
    }

    /// Rules for one cycle in evaluation order.
    pub fn rules_for(&self, cycle_id: &str) -> Result<&[Rule], EngineError> {
        self.cycles
            .get(cycle_id)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::UnknownCycle(cycle_id.to_string()))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn cycle_ids(&self) -> impl Iterator<Item = &str> {
        self.cycles.keys().map(String::as_str)
    }
}

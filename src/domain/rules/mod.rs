pub mod flaky;
pub mod recurrent;
pub mod stale;
pub mod timeout;
pub mod trunk;

#[cfg(test)]
pub(crate) mod test_support;

use crate::domain::entities::alert::{AlertBatch, AlertRecord};
use crate::domain::entities::signal::SignalSnapshot;
use crate::domain::value_objects::thresholds::RuleThresholds;

/// A deterministic detection rule: snapshot + thresholds in, candidate alerts out.
/// Rules do no I/O and take every timestamp from the snapshot.
pub trait Rule: Send + Sync {
    /// Returns the unique name of this rule
    fn name(&self) -> &'static str;

    /// Evaluates the rule against a snapshot using the given thresholds
    fn evaluate(&self, snapshot: &SignalSnapshot, thresholds: &RuleThresholds) -> Vec<AlertRecord>;
}

/// Returns every built-in detection rule
#[must_use]
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(recurrent::RecurrentlyFailingRule),
        Box::new(timeout::JobTimeoutRule),
        Box::new(flaky::FlakyJobRule),
        Box::new(trunk::TrunkRedRule),
        Box::new(stale::StaleSignalRule),
    ]
}

/// Keeps only the rules whose names appear in `enabled`. An empty list keeps all.
#[must_use]
pub fn select_rules(rules: Vec<Box<dyn Rule>>, enabled: &[String]) -> Vec<Box<dyn Rule>> {
    if enabled.is_empty() {
        return rules;
    }
    rules
        .into_iter()
        .filter(|r| enabled.iter().any(|name| name == r.name()))
        .collect()
}

/// Engine that runs a collection of rules against signal snapshots
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    #[must_use]
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Runs every rule and folds the candidates into a deduplicated, ordered batch.
    #[must_use]
    pub fn analyze(&self, snapshot: &SignalSnapshot, thresholds: &RuleThresholds) -> AlertBatch {
        let candidates: Vec<AlertRecord> = self
            .rules
            .iter()
            .flat_map(|rule| {
                let found = rule.evaluate(snapshot, thresholds);
                if !found.is_empty() {
                    tracing::debug!(rule = rule.name(), count = found.len(), "rule fired");
                }
                found
            })
            .collect();
        AlertBatch::from_candidates(candidates)
    }
}

use crate::domain::entities::alert::AlertRecord;
use crate::domain::entities::signal::SignalSnapshot;
use crate::domain::value_objects::{AlertCategory, RuleThresholds, Severity};

use super::Rule;

/// Too many jobs failing on the newest commit of the branch.
pub struct TrunkRedRule;

impl Rule for TrunkRedRule {
    fn name(&self) -> &'static str {
        "trunk_red"
    }

    #[allow(clippy::cast_precision_loss)]
    fn evaluate(&self, snapshot: &SignalSnapshot, thresholds: &RuleThresholds) -> Vec<AlertRecord> {
        let Some(head) = snapshot.commits.first() else {
            return vec![];
        };

        let completed = head.jobs.iter().filter(|j| j.conclusion.is_completed()).count();
        if completed == 0 || completed < thresholds.red_min_jobs {
            return vec![];
        }

        let mut failing: Vec<&str> = head
            .jobs
            .iter()
            .filter(|j| j.conclusion.is_failure())
            .map(|j| j.name.as_str())
            .collect();
        failing.sort_unstable();

        let ratio = failing.len() as f64 / completed as f64;
        if ratio < thresholds.red_ratio {
            return vec![];
        }

        vec![AlertRecord::new(
            format!("{}-trunk-red", snapshot.branch),
            Severity::Critical,
            AlertCategory::TrunkHealth,
            snapshot.fetched_at,
        )
        .with_field("branch", snapshot.branch.as_str())
        .with_field("sha", head.sha.as_str())
        .with_field("failing_ratio", (ratio * 100.0).round() / 100.0)
        .with_field("completed_jobs", completed)
        .with_field("failing_jobs", failing)]
    }
}

use chrono::Duration;

use crate::domain::entities::alert::AlertRecord;
use crate::domain::entities::signal::SignalSnapshot;
use crate::domain::value_objects::{AlertCategory, RuleThresholds, Severity};

use super::Rule;

/// No new commit has reported signal for longer than the configured window.
pub struct StaleSignalRule;

impl Rule for StaleSignalRule {
    fn name(&self) -> &'static str {
        "stale_signal"
    }

    fn evaluate(&self, snapshot: &SignalSnapshot, thresholds: &RuleThresholds) -> Vec<AlertRecord> {
        let Some(head) = snapshot.commits.first() else {
            return vec![];
        };

        // A window chrono cannot represent never elapses.
        let Some(window) = Duration::try_minutes(thresholds.stale_after_mins) else {
            return vec![];
        };
        let age = snapshot.fetched_at - head.committed_at;
        if age <= window {
            return vec![];
        }

        vec![AlertRecord::new(
            format!("{}-stale-signal", snapshot.branch),
            Severity::Medium,
            AlertCategory::StaleSignal,
            snapshot.fetched_at,
        )
        .with_field("branch", snapshot.branch.as_str())
        .with_field("sha", head.sha.as_str())
        .with_field("last_commit_at", head.committed_at.to_rfc3339())
        .with_field("age_mins", age.num_minutes())]
    }
}

use crate::domain::entities::alert::AlertRecord;
use crate::domain::entities::signal::SignalSnapshot;
use crate::domain::value_objects::{AlertCategory, RuleThresholds, Severity};

use super::Rule;

/// A job that failed on every one of its most recent completed runs.
pub struct RecurrentlyFailingRule;

impl Rule for RecurrentlyFailingRule {
    fn name(&self) -> &'static str {
        "recurrently_failing"
    }

    fn evaluate(&self, snapshot: &SignalSnapshot, thresholds: &RuleThresholds) -> Vec<AlertRecord> {
        let needed = thresholds.consecutive_failures.max(1);

        snapshot
            .job_names(thresholds.max_commits)
            .into_iter()
            .filter_map(|name| {
                let streak: Vec<_> = snapshot
                    .completed_history(name, thresholds.max_commits)
                    .take_while(|(_, j)| j.conclusion.is_failure())
                    .collect();
                if streak.len() < needed {
                    return None;
                }

                let mut severity = Severity::High;
                if streak.len() >= needed * 2 {
                    severity = severity.escalate();
                }
                let (latest_commit, latest_job) = streak[0];
                let (first_commit, _) = streak[streak.len() - 1];

                let mut record = AlertRecord::new(
                    format!("{name}-recurrently-failing"),
                    severity,
                    AlertCategory::RecurrentFailure,
                    snapshot.fetched_at,
                )
                .with_field("job", name)
                .with_field("branch", snapshot.branch.as_str())
                .with_field("streak", streak.len())
                .with_field("latest_sha", latest_commit.sha.as_str())
                .with_field("first_failing_sha", first_commit.sha.as_str())
                .with_field(
                    "first_failing_at",
                    first_commit.committed_at.to_rfc3339(),
                );
                if let Some(url) = &latest_job.url {
                    record = record.with_field("url", url.as_str());
                }
                Some(record)
            })
            .collect()
    }
}

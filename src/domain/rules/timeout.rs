use crate::domain::entities::alert::AlertRecord;
use crate::domain::entities::signal::{JobConclusion, SignalSnapshot};
use crate::domain::value_objects::{AlertCategory, RuleThresholds, Severity};

use super::Rule;

/// The most recent completed run of a job hit its time limit.
pub struct JobTimeoutRule;

impl Rule for JobTimeoutRule {
    fn name(&self) -> &'static str {
        "job_timeout"
    }

    fn evaluate(&self, snapshot: &SignalSnapshot, thresholds: &RuleThresholds) -> Vec<AlertRecord> {
        snapshot
            .job_names(thresholds.max_commits)
            .into_iter()
            .filter_map(|name| {
                let (commit, run) = snapshot
                    .completed_history(name, thresholds.max_commits)
                    .next()?;
                if run.conclusion != JobConclusion::TimedOut {
                    return None;
                }
                let mut record = AlertRecord::new(
                    format!("{name}-timeout"),
                    Severity::High,
                    AlertCategory::Timeout,
                    snapshot.fetched_at,
                )
                .with_field("job", name)
                .with_field("branch", snapshot.branch.as_str())
                .with_field("sha", commit.sha.as_str());
                if let Some(secs) = run.duration_secs {
                    record = record.with_field("duration_secs", secs);
                }
                if let Some(url) = &run.url {
                    record = record.with_field("url", url.as_str());
                }
                Some(record)
            })
            .collect()
    }
}

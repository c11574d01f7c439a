use crate::domain::entities::alert::AlertRecord;
use crate::domain::entities::signal::SignalSnapshot;
use crate::domain::value_objects::{AlertCategory, RuleThresholds, Severity};

use super::Rule;

/// A job whose verdict keeps flipping between success and failure.
pub struct FlakyJobRule;

impl Rule for FlakyJobRule {
    fn name(&self) -> &'static str {
        "flaky_job"
    }

    fn evaluate(&self, snapshot: &SignalSnapshot, thresholds: &RuleThresholds) -> Vec<AlertRecord> {
        let needed = thresholds.flaky_flips.max(1);

        snapshot
            .job_names(thresholds.max_commits)
            .into_iter()
            .filter_map(|name| {
                let verdicts: Vec<bool> = snapshot
                    .completed_history(name, thresholds.max_commits)
                    .map(|(_, j)| j.conclusion.is_failure())
                    .collect();
                let flips = verdicts.windows(2).filter(|w| w[0] != w[1]).count();
                if flips < needed {
                    return None;
                }
                let failures = verdicts.iter().filter(|failed| **failed).count();
                Some(
                    AlertRecord::new(
                        format!("{name}-flaky"),
                        Severity::Low,
                        AlertCategory::Flaky,
                        snapshot.fetched_at,
                    )
                    .with_field("job", name)
                    .with_field("branch", snapshot.branch.as_str())
                    .with_field("flips", flips)
                    .with_field("failures", failures)
                    .with_field("runs", verdicts.len()),
                )
            })
            .collect()
    }
}

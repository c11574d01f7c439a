use serde::{Deserialize, Serialize};

/// Tunables shared by the detection rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// Number of newest commits the rules look at
    pub max_commits: usize,
    /// Completed failures in a row before a job counts as recurrently failing
    pub consecutive_failures: usize,
    /// Success/failure flips in the window before a job counts as flaky
    pub flaky_flips: usize,
    /// Share of failing jobs on the newest commit that marks the branch red
    pub red_ratio: f64,
    /// Completed jobs needed on the newest commit before the ratio is judged
    pub red_min_jobs: usize,
    /// Age in minutes of the newest commit after which the signal is stale
    pub stale_after_mins: i64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            max_commits: 10,
            consecutive_failures: 2,
            flaky_flips: 3,
            red_ratio: 0.5,
            red_min_jobs: 3,
            stale_after_mins: 240,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_are_reasonable() {
        let t = RuleThresholds::default();
        assert!(t.consecutive_failures >= 2);
        assert!(t.consecutive_failures <= t.max_commits);
        assert!(t.red_ratio > 0.0 && t.red_ratio <= 1.0);
        assert!(t.stale_after_mins > 0);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CI signal for a branch at fetch time. Commits are ordered newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub branch: String,
    pub fetched_at: DateTime<Utc>,
    pub commits: Vec<CommitSignal>,
}

/// Job results reported for one commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitSignal {
    pub sha: String,
    pub committed_at: DateTime<Utc>,
    pub jobs: Vec<JobResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub name: String,
    pub conclusion: JobConclusion,
    #[serde(default)]
    pub duration_secs: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Outcome of a CI job run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobConclusion {
    Success,
    Failure,
    TimedOut,
    Cancelled,
    Pending,
    Skipped,
}

impl JobConclusion {
    /// Whether the run finished with a verdict the rules can reason about.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::TimedOut)
    }

    /// Timeouts count as failures for signal health.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failure | Self::TimedOut)
    }
}

impl std::fmt::Display for JobConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
            Self::Pending => "pending",
            Self::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

impl SignalSnapshot {
    /// Newest-first completed results of `job` across the first `max_commits`
    /// commits, paired with the commit they ran on.
    pub fn completed_history<'a>(
        &'a self,
        job: &'a str,
        max_commits: usize,
    ) -> impl Iterator<Item = (&'a CommitSignal, &'a JobResult)> + 'a {
        self.commits.iter().take(max_commits).filter_map(move |commit| {
            commit
                .jobs
                .iter()
                .find(|j| j.name == job && j.conclusion.is_completed())
                .map(|j| (commit, j))
        })
    }

    /// Distinct job names in the window, sorted.
    #[must_use]
    pub fn job_names(&self, max_commits: usize) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .commits
            .iter()
            .take(max_commits)
            .flat_map(|c| c.jobs.iter().map(|j| j.name.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

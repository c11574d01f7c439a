use chrono::{Duration, TimeZone, Utc};

use crate::domain::entities::signal::{CommitSignal, JobConclusion, JobResult, SignalSnapshot};

pub fn job(name: &str, conclusion: JobConclusion) -> JobResult {
    JobResult {
        name: name.to_string(),
        conclusion,
        duration_secs: Some(600),
        url: Some(format!("https://ci.example.com/{name}")),
    }
}

/// Builds a snapshot on `main` with one commit per entry, newest first,
/// spaced ten minutes apart and ending five minutes before fetch time.
pub fn make_snapshot(commits: Vec<Vec<JobResult>>) -> SignalSnapshot {
    let fetched_at = Utc
        .with_ymd_and_hms(2026, 10, 14, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let commits = commits
        .into_iter()
        .enumerate()
        .map(|(i, jobs)| CommitSignal {
            sha: format!("sha{i}"),
            committed_at: fetched_at - Duration::minutes(5 + 10 * i64::try_from(i).unwrap_or(0)),
            jobs,
        })
        .collect();
    SignalSnapshot {
        branch: "main".to_string(),
        fetched_at,
        commits,
    }
}

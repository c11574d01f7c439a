use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::entities::signal::{CommitSignal, JobConclusion, JobResult, SignalSnapshot};
use crate::domain::ports::data_source::DataSourceError;

/// HUD grid response: one row per commit, job cells aligned with `jobNames`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HudPayload {
    job_names: Vec<String>,
    sha_grid: Vec<HudRow>,
    /// Pinned fetch time; recorded snapshots carry it so replays stay deterministic.
    #[serde(default)]
    fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct HudRow {
    sha: String,
    time: DateTime<Utc>,
    #[serde(default)]
    jobs: Vec<HudJob>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HudJob {
    #[serde(default)]
    conclusion: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    duration_s: Option<u64>,
}

fn map_conclusion(raw: Option<&str>) -> JobConclusion {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("success") => JobConclusion::Success,
        Some("failure" | "startup_failure" | "action_required") => JobConclusion::Failure,
        Some("timed_out") => JobConclusion::TimedOut,
        Some("cancelled") => JobConclusion::Cancelled,
        Some("skipped" | "neutral") => JobConclusion::Skipped,
        None | Some("" | "pending" | "queued" | "in_progress") => JobConclusion::Pending,
        Some(other) => {
            tracing::warn!(conclusion = other, "unknown job conclusion, treating as pending");
            JobConclusion::Pending
        }
    }
}

/// Decode a HUD response body into a snapshot.
///
/// Cells with neither a conclusion nor a URL mean the job did not run on that
/// commit and are dropped. Rows are sorted newest first.
///
/// # Errors
///
/// Returns `DataSourceError::Malformed` if the body is not valid JSON of the
/// expected shape or a row has more cells than there are job names.
pub fn parse_hud_payload(
    body: &[u8],
    branch: &str,
    fetched_at: DateTime<Utc>,
) -> Result<SignalSnapshot, DataSourceError> {
    let payload: HudPayload = serde_json::from_slice(body)
        .map_err(|e| DataSourceError::Malformed(format!("invalid HUD payload: {e}")))?;

    let mut commits = Vec::with_capacity(payload.sha_grid.len());
    for row in payload.sha_grid {
        if row.jobs.len() > payload.job_names.len() {
            return Err(DataSourceError::Malformed(format!(
                "commit {} has {} job cells but only {} job names",
                row.sha,
                row.jobs.len(),
                payload.job_names.len()
            )));
        }
        let jobs = row
            .jobs
            .into_iter()
            .zip(payload.job_names.iter())
            .filter(|(cell, _)| cell.conclusion.is_some() || cell.html_url.is_some())
            .map(|(cell, name)| JobResult {
                name: name.clone(),
                conclusion: map_conclusion(cell.conclusion.as_deref()),
                duration_secs: cell.duration_s,
                url: cell.html_url,
            })
            .collect();
        commits.push(CommitSignal {
            sha: row.sha,
            committed_at: row.time,
            jobs,
        });
    }
    commits.sort_by(|a, b| b.committed_at.cmp(&a.committed_at));

    Ok(SignalSnapshot {
        branch: branch.to_string(),
        fetched_at: payload.fetched_at.unwrap_or(fetched_at),
        commits,
    })
}

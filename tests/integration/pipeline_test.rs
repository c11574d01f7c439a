#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use ci_alerts::application::config::AppConfig;
use ci_alerts::application::services::pipeline::{RunOutcome, EXIT_FAILED, EXIT_OK};
use ci_alerts::domain::entities::signal::SignalSnapshot;
use ci_alerts::domain::ports::data_source::{DataSourceError, SignalSource};
use ci_alerts::domain::ports::sink::DeliveryError;
use ci_alerts::domain::value_objects::RunState;
use ci_alerts::infrastructure::sinks::recording::RecordingSink;
use ci_alerts::infrastructure::sources::hud_payload::parse_hud_payload;
use ci_alerts::infrastructure::sources::memory::InMemorySource;
use ci_alerts::presentation::cli::commands::run::run_pipeline;

fn load_snapshot(name: &str) -> SignalSnapshot {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let body = std::fs::read(&path).expect("Failed to read fixture");
    let fallback = Utc
        .with_ymd_and_hms(2026, 10, 14, 12, 0, 0)
        .single()
        .expect("valid time");
    parse_hud_payload(&body, "main", fallback).expect("Failed to parse fixture")
}

#[tokio::test]
async fn timeout_scenario_delivers_one_record() {
    let source = InMemorySource::new(load_snapshot("hud_timeout.json"));
    let sink = RecordingSink::new();
    let config = AppConfig::default();

    let report = run_pipeline(&config, &source, &sink, &CancellationToken::new())
        .await
        .expect("run");

    assert_eq!(report.exit_code(), EXIT_OK);
    assert_eq!(report.state, RunState::Delivered);
    assert!(matches!(
        report.outcome,
        RunOutcome::Delivered {
            alerts: 1,
            attempts: 1
        }
    ));

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 1);
    let (namespace, batch) = &delivered[0];
    assert_eq!(namespace.organization, "pytorch");
    assert_eq!(namespace.repo, "pytorch");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.records()[0].key, "job123-timeout");
}

#[tokio::test]
async fn organization_override_reaches_sink() {
    let source = InMemorySource::new(load_snapshot("hud_timeout.json"));
    let sink = RecordingSink::new();
    let mut config = AppConfig::default();
    config.target.organization = "acme".into();
    config.target.repo = "widgets".into();

    run_pipeline(&config, &source, &sink, &CancellationToken::new())
        .await
        .expect("run");

    let delivered = sink.delivered();
    assert_eq!(delivered[0].0.organization, "acme");
    assert_eq!(delivered[0].0.repo, "widgets");
}

#[tokio::test]
async fn unreachable_source_fails_without_touching_sink() {
    let source = InMemorySource::unreachable();
    let sink = RecordingSink::new();

    let report = run_pipeline(
        &AppConfig::default(),
        &source,
        &sink,
        &CancellationToken::new(),
    )
    .await
    .expect("run");

    assert_eq!(report.exit_code(), EXIT_FAILED);
    assert_eq!(report.state, RunState::Failed);
    assert!(report.is_failed());
    assert_eq!(sink.call_count(), 0);
}

#[tokio::test]
async fn green_trunk_skips_upload() {
    let source = InMemorySource::new(load_snapshot("hud_green.json"));
    let sink = RecordingSink::new();

    let report = run_pipeline(
        &AppConfig::default(),
        &source,
        &sink,
        &CancellationToken::new(),
    )
    .await
    .expect("run");

    assert_eq!(report.exit_code(), EXIT_OK);
    assert!(matches!(
        report.outcome,
        RunOutcome::Delivered {
            alerts: 0,
            attempts: 0
        }
    ));
    assert_eq!(sink.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_within_budget() {
    let source = InMemorySource::new(load_snapshot("hud_red_trunk.json"));
    let sink = RecordingSink::failing(2);

    let report = run_pipeline(
        &AppConfig::default(),
        &source,
        &sink,
        &CancellationToken::new(),
    )
    .await
    .expect("run");

    assert_eq!(report.exit_code(), EXIT_OK);
    assert!(matches!(
        report.outcome,
        RunOutcome::Delivered {
            alerts: 4,
            attempts: 3
        }
    ));
    assert_eq!(sink.call_count(), 3);
    assert_eq!(sink.delivered().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_fail_the_run() {
    let source = InMemorySource::new(load_snapshot("hud_red_trunk.json"));
    let sink = RecordingSink::failing(4);

    let report = run_pipeline(
        &AppConfig::default(),
        &source,
        &sink,
        &CancellationToken::new(),
    )
    .await
    .expect("run");

    assert_eq!(report.exit_code(), EXIT_FAILED);
    assert!(matches!(
        report.outcome,
        RunOutcome::Failed(ci_alerts::application::services::pipeline::PipelineError::Delivery(
            DeliveryError::Exhausted { attempts: 3, .. }
        ))
    ));
    assert_eq!(sink.call_count(), 3);
    assert!(sink.delivered().is_empty());
}

#[tokio::test]
async fn cancelled_run_stops_before_any_call() {
    let source = InMemorySource::new(load_snapshot("hud_timeout.json"));
    let sink = RecordingSink::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = run_pipeline(&AppConfig::default(), &source, &sink, &cancel)
        .await
        .expect("run");

    assert_eq!(report.exit_code(), EXIT_OK);
    assert_eq!(report.state, RunState::Cancelled);
    assert!(matches!(
        report.outcome,
        RunOutcome::Cancelled {
            during: RunState::Generating
        }
    ));
    assert_eq!(source.fetch_count(), 0);
    assert_eq!(sink.call_count(), 0);
}

/// Hands the marker to a newer run mid-fetch, then stalls.
struct SupersedingSource {
    marker: PathBuf,
    newer_run: Uuid,
}

#[async_trait]
impl SignalSource for SupersedingSource {
    fn name(&self) -> &str {
        "superseding"
    }

    async fn fetch(&self) -> Result<SignalSnapshot, DataSourceError> {
        std::fs::write(&self.marker, self.newer_run.to_string())
            .map_err(|e| DataSourceError::Unreachable(e.to_string()))?;
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(load_snapshot("hud_timeout.json"))
    }
}

#[tokio::test(start_paused = true)]
async fn newer_run_cancels_current_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let marker = dir.path().join("ci-alerts.run");
    let newer_run = Uuid::new_v4();
    let source = SupersedingSource {
        marker: marker.clone(),
        newer_run,
    };
    let sink = RecordingSink::new();

    let mut config = AppConfig::default();
    config.run.marker_path = Some(marker.to_string_lossy().into_owned());
    config.run.marker_poll_ms = 10;

    let report = run_pipeline(&config, &source, &sink, &CancellationToken::new())
        .await
        .expect("run");

    assert_eq!(report.exit_code(), EXIT_OK);
    assert!(matches!(
        report.outcome,
        RunOutcome::Cancelled {
            during: RunState::Generating
        }
    ));
    assert_eq!(sink.call_count(), 0);
    // The newer run still owns the marker.
    assert_eq!(
        std::fs::read_to_string(&marker).expect("marker"),
        newer_run.to_string()
    );
}

#[tokio::test]
async fn finished_run_leaves_its_claim_for_the_next_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let marker = dir.path().join("ci-alerts.run");
    let source = InMemorySource::new(load_snapshot("hud_green.json"));
    let sink = RecordingSink::new();

    let mut config = AppConfig::default();
    config.run.marker_path = Some(marker.to_string_lossy().into_owned());

    let report = run_pipeline(&config, &source, &sink, &CancellationToken::new())
        .await
        .expect("run");

    assert_eq!(report.state, RunState::Delivered);
    assert_eq!(
        std::fs::read_to_string(&marker).expect("marker"),
        report.run_id.to_string()
    );
}

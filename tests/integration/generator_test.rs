#![allow(clippy::expect_used)]

use std::path::PathBuf;
use std::time::Duration;

use ci_alerts::application::config::AppConfig;
use ci_alerts::application::services::generator::{AlertGenerator, GenerateError};
use ci_alerts::domain::entities::alert::AlertBatch;
use ci_alerts::domain::ports::data_source::{DataSourceError, SignalSource};
use ci_alerts::domain::rules::{default_rules, RuleEngine};
use ci_alerts::domain::value_objects::{AlertCategory, RuleThresholds, Severity};
use ci_alerts::infrastructure::sources::file::FileSource;
use tokio_util::sync::CancellationToken;

fn fixture(name: &str) -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

async fn generate_from(source: &dyn SignalSource) -> Result<AlertBatch, GenerateError> {
    let engine = RuleEngine::new(default_rules());
    let thresholds = RuleThresholds::from(&AppConfig::default().rules);
    AlertGenerator::new(source, &engine, &thresholds, Duration::from_secs(5))
        .generate(&CancellationToken::new())
        .await
}

#[tokio::test]
async fn timed_out_job_yields_single_alert() {
    let source = FileSource::new(fixture("hud_timeout.json"), "main");
    let batch = generate_from(&source).await.expect("generate");

    assert_eq!(batch.len(), 1);
    let alert = &batch.records()[0];
    assert_eq!(alert.key, "job123-timeout");
    assert_eq!(alert.severity, Severity::High);
    assert_eq!(alert.category, AlertCategory::Timeout);
    assert_eq!(alert.payload["sha"], "b7e1c2d");
    assert_eq!(alert.payload["duration_secs"], 14400);
}

#[tokio::test]
async fn green_trunk_yields_empty_batch() {
    let source = FileSource::new(fixture("hud_green.json"), "main");
    let batch = generate_from(&source).await.expect("generate");
    assert!(batch.is_empty());
}

#[tokio::test]
async fn red_trunk_is_ordered_by_severity_then_key() {
    let source = FileSource::new(fixture("hud_red_trunk.json"), "main");
    let batch = generate_from(&source).await.expect("generate");

    let keys: Vec<&str> = batch.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "main-trunk-red",
            "lint-recurrently-failing",
            "linux / test-recurrently-failing",
            "win / test-recurrently-failing",
        ]
    );
    assert_eq!(batch.records()[0].severity, Severity::Critical);
    assert!(batch
        .iter()
        .skip(1)
        .all(|a| a.severity == Severity::High));
}

#[tokio::test]
async fn keys_are_unique_within_a_batch() {
    let source = FileSource::new(fixture("hud_red_trunk.json"), "main");
    let batch = generate_from(&source).await.expect("generate");

    let mut keys: Vec<&str> = batch.iter().map(|a| a.key.as_str()).collect();
    let total = keys.len();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), total);
}

#[tokio::test]
async fn same_snapshot_generates_same_batch() {
    let source = FileSource::new(fixture("hud_red_trunk.json"), "main");
    let first = generate_from(&source).await.expect("first");
    let second = generate_from(&source).await.expect("second");
    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_recording_is_unreachable() {
    let source = FileSource::new(fixture("does_not_exist.json"), "main");
    let err = generate_from(&source).await.expect_err("should fail");
    assert!(matches!(
        err,
        GenerateError::DataSource(DataSourceError::Unreachable(_))
    ));
}

#[tokio::test]
async fn disabled_rule_is_skipped() {
    let source = FileSource::new(fixture("hud_red_trunk.json"), "main");
    let mut config = AppConfig::default();
    config.rules.enabled = vec!["trunk_red".to_string()];
    let engine = ci_alerts::presentation::cli::commands::build_rule_engine(&config);
    let thresholds = RuleThresholds::from(&config.rules);

    let batch = AlertGenerator::new(&source, &engine, &thresholds, Duration::from_secs(5))
        .generate(&CancellationToken::new())
        .await
        .expect("generate");

    assert_eq!(batch.len(), 1);
    assert_eq!(batch.records()[0].category, AlertCategory::TrunkHealth);
}

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::build_rule_engine;
use crate::application::config::AppConfig;
use crate::application::services::generator::AlertGenerator;
use crate::application::services::pipeline::{Pipeline, RunReport};
use crate::application::services::uploader::{AlertUploader, RetryPolicy};
use crate::domain::ports::data_source::SignalSource;
use crate::domain::ports::sink::AlertSink;
use crate::domain::value_objects::thresholds::RuleThresholds;
use crate::infrastructure::os::run_marker::RunMarker;

/// One scheduled run: generate, then upload, to a terminal state.
///
/// When `run.marker_path` is configured the run claims the marker and
/// cancels itself as soon as a newer run claims it.
///
/// # Errors
///
/// Returns an error only if the run marker cannot be written. Pipeline
/// failures are carried by the returned report.
pub async fn run_pipeline(
    config: &AppConfig,
    source: &dyn SignalSource,
    sink: &dyn AlertSink,
    cancel: &CancellationToken,
) -> anyhow::Result<RunReport> {
    let run_id = Uuid::new_v4();

    // Shutdown signals cancel `cancel`; the marker watcher only this run.
    let run_cancel = cancel.child_token();
    let marker = match &config.run.marker_path {
        Some(path) => {
            let marker = RunMarker::claim(path, run_id)?;
            let watcher = marker.watch(
                run_cancel.clone(),
                Duration::from_millis(config.run.marker_poll_ms.max(10)),
            );
            Some((marker, watcher))
        }
        None => None,
    };

    let engine = build_rule_engine(config);
    let thresholds = RuleThresholds::from(&config.rules);
    let namespace = config.namespace();

    let generator = AlertGenerator::new(
        source,
        &engine,
        &thresholds,
        Duration::from_secs(config.source.timeout_secs),
    );
    let uploader = AlertUploader::new(
        sink,
        &namespace,
        RetryPolicy::from(&config.upload),
        Duration::from_secs(config.sink.timeout_secs),
    );

    let report = Pipeline::new(generator, uploader)
        .run_once(run_id, &run_cancel)
        .await;

    // The marker stays behind; the next run's claim overwrites it.
    if let Some((_, watcher)) = marker {
        watcher.abort();
    }
    Ok(report)
}

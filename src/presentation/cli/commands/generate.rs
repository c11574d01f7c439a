use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::build_rule_engine;
use crate::application::config::AppConfig;
use crate::application::services::generator::{AlertGenerator, GenerateError};
use crate::application::services::pipeline::{EXIT_FAILED, EXIT_OK};
use crate::domain::entities::alert::AlertBatch;
use crate::domain::ports::data_source::SignalSource;
use crate::domain::value_objects::thresholds::RuleThresholds;
use crate::presentation::cli::formatters::batch_fmt;

/// Generate a batch and print it; the sink is never contacted.
///
/// Returns the process exit code: non-zero when the data source fails.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub async fn run_generate(
    config: &AppConfig,
    source: &dyn SignalSource,
    json: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<u8> {
    let engine = build_rule_engine(config);
    let thresholds = RuleThresholds::from(&config.rules);
    let generator = AlertGenerator::new(
        source,
        &engine,
        &thresholds,
        Duration::from_secs(config.source.timeout_secs),
    );

    match generator.generate(cancel).await {
        Ok(batch) => {
            print_batch(&batch, json)?;
            Ok(EXIT_OK)
        }
        Err(GenerateError::Cancelled) => {
            tracing::info!("generation cancelled");
            Ok(EXIT_OK)
        }
        Err(GenerateError::DataSource(e)) => {
            eprintln!("generation failed: {e}");
            Ok(EXIT_FAILED)
        }
    }
}

fn print_batch(batch: &AlertBatch, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(batch)?);
    } else {
        print!("{}", batch_fmt::render_batch(batch));
    }
    Ok(())
}

pub mod ingest;
pub mod recording;
pub mod stdout;

use anyhow::Context;

use crate::application::config::{AppConfig, Credentials, ENV_SINK_API_KEY};
use crate::domain::ports::sink::AlertSink;

use self::ingest::IngestSink;
use self::stdout::StdoutSink;

/// Build the sink for a run. `dry_run` prints instead of uploading and needs
/// no credentials.
///
/// # Errors
///
/// Returns an error if the API key is missing or the HTTP client cannot be
/// created.
pub fn create_sink(
    config: &AppConfig,
    credentials: &Credentials,
    dry_run: bool,
) -> anyhow::Result<Box<dyn AlertSink>> {
    if dry_run {
        return Ok(Box::new(StdoutSink));
    }
    let api_key = credentials
        .sink_api_key
        .clone()
        .with_context(|| format!("missing sink API key ({ENV_SINK_API_KEY})"))?;
    let sink = IngestSink::new(
        &config.sink.base_url,
        &config.sink.workspace,
        &config.sink.collection,
        api_key,
        config.sink.timeout_secs,
    )
    .context("cannot build ingest client")?;
    Ok(Box::new(sink))
}

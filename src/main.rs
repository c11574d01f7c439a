use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ci_alerts::application::config::{AppConfig, Credentials};
use ci_alerts::application::services::pipeline::EXIT_USAGE;
use ci_alerts::infrastructure::os::signals::cancel_on_shutdown_signal;
use ci_alerts::infrastructure::sinks::create_sink;
use ci_alerts::infrastructure::sources::create_source;
use ci_alerts::presentation::cli::app::{Cli, Commands};
use ci_alerts::presentation::cli::commands::generate::run_generate;
use ci_alerts::presentation::cli::commands::run::run_pipeline;
use ci_alerts::presentation::cli::formatters::batch_fmt::render_report;

fn setup_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = if let Some(ref path) = cli.config {
        AppConfig::load_from(path)?
    } else {
        AppConfig::load()?
    };
    // clap already folded CI_ALERTS_ORGANIZATION / _REPO / _BRANCH into these
    config.override_target(
        cli.organization.as_deref(),
        cli.repo.as_deref(),
        cli.branch.as_deref(),
    );
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = load_config(&cli)?;
    let credentials = Credentials::from_env(|name| std::env::var(name).ok());
    tracing::debug!(
        organization = %config.target.organization,
        repo = %config.target.repo,
        branch = %config.target.branch,
        "configuration loaded"
    );

    // Manual DI: main.rs is the only place that knows concrete types
    let source = create_source(&config, &credentials).context("cannot create data source")?;

    let cancel = CancellationToken::new();
    let signals = cancel_on_shutdown_signal(cancel.clone());

    let code = match cli.command {
        Some(Commands::Generate { json }) => {
            run_generate(&config, source.as_ref(), json, &cancel).await?
        }
        Some(Commands::Run { dry_run }) => {
            execute_run(&config, &credentials, source.as_ref(), dry_run, &cancel).await?
        }
        None => execute_run(&config, &credentials, source.as_ref(), false, &cancel).await?,
    };

    signals.abort();
    Ok(code)
}

async fn execute_run(
    config: &AppConfig,
    credentials: &Credentials,
    source: &dyn ci_alerts::domain::ports::SignalSource,
    dry_run: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<u8> {
    let sink = create_sink(config, credentials, dry_run).context("cannot create sink")?;
    let report = run_pipeline(config, source, sink.as_ref(), cancel).await?;
    eprintln!("{}", render_report(&report));
    Ok(report.exit_code())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::application::config::{ENV_BRANCH, ENV_ORGANIZATION, ENV_REPO};

/// ci-alerts: turn CI signal into alerts and ship them to the sink
///
/// Meant to be invoked every few minutes by a scheduler. Each invocation is
/// one run: fetch signal, generate alerts, upload them.
#[derive(Parser, Debug)]
#[command(name = "ci-alerts")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to custom config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Organization namespace in the sink
    #[arg(long, global = true, env = ENV_ORGANIZATION)]
    pub organization: Option<String>,

    /// Repository namespace in the sink
    #[arg(long, global = true, env = ENV_REPO)]
    pub repo: Option<String>,

    /// Branch whose CI signal is inspected
    #[arg(long, global = true, env = ENV_BRANCH)]
    pub branch: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate alerts and upload them (one scheduled run)
    #[command(alias = "r")]
    Run {
        /// Print the upload body instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate alerts and print them without uploading
    #[command(alias = "g")]
    Generate {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

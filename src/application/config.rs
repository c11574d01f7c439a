use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::ports::sink::SinkNamespace;
use crate::domain::value_objects::thresholds::RuleThresholds;

pub const ENV_ORGANIZATION: &str = "CI_ALERTS_ORGANIZATION";
pub const ENV_REPO: &str = "CI_ALERTS_REPO";
pub const ENV_BRANCH: &str = "CI_ALERTS_BRANCH";
pub const ENV_SINK_API_KEY: &str = "CI_ALERTS_SINK_API_KEY";
pub const ENV_SOURCE_TOKEN: &str = "CI_ALERTS_SOURCE_TOKEN";

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Namespace the alerts belong to, and the branch whose signal is inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_organization")]
    pub organization: String,
    #[serde(default = "default_repo")]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Hud,
    File,
}

/// Upstream CI signal source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,
    #[serde(default = "default_hud_url")]
    pub base_url: String,
    /// Snapshot file read when `kind = "file"`
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

/// Document-ingest sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default = "default_sink_url")]
    pub base_url: String,
    #[serde(default = "default_workspace")]
    pub workspace: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_sink_timeout")]
    pub timeout_secs: u64,
}

/// Rule selection and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Rule names to run; empty runs every rule
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,
    #[serde(default = "default_consecutive_failures")]
    pub consecutive_failures: usize,
    #[serde(default = "default_flaky_flips")]
    pub flaky_flips: usize,
    #[serde(default = "default_red_ratio")]
    pub red_ratio: f64,
    #[serde(default = "default_red_min_jobs")]
    pub red_min_jobs: usize,
    #[serde(default = "default_stale_after_mins")]
    pub stale_after_mins: i64,
}

/// Retry policy of the uploader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,
}

/// Run supersession. When `marker_path` is set, a run that sees another run
/// id in the marker file cancels itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub marker_path: Option<String>,
    #[serde(default = "default_marker_poll")]
    pub marker_poll_ms: u64,
}

// --- Defaults ---

fn default_organization() -> String {
    "pytorch".into()
}

fn default_repo() -> String {
    "pytorch".into()
}

fn default_branch() -> String {
    "main".into()
}

const fn default_source_kind() -> SourceKind {
    SourceKind::Hud
}

fn default_hud_url() -> String {
    "https://hud.pytorch.org".into()
}

const fn default_source_timeout() -> u64 {
    30
}

fn default_sink_url() -> String {
    "https://api.usw2a1.rockset.com".into()
}

fn default_workspace() -> String {
    "commons".into()
}

fn default_collection() -> String {
    "alerts".into()
}

const fn default_sink_timeout() -> u64 {
    15
}

const fn default_max_commits() -> usize {
    10
}

const fn default_consecutive_failures() -> usize {
    2
}

const fn default_flaky_flips() -> usize {
    3
}

const fn default_red_ratio() -> f64 {
    0.5
}

const fn default_red_min_jobs() -> usize {
    3
}

const fn default_stale_after_mins() -> i64 {
    240
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_backoff_base() -> u64 {
    500
}

const fn default_backoff_max() -> u64 {
    8_000
}

const fn default_marker_poll() -> u64 {
    500
}

// --- Default impls ---

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            repo: default_repo(),
            branch: default_branch(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            base_url: default_hud_url(),
            path: None,
            timeout_secs: default_source_timeout(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            base_url: default_sink_url(),
            workspace: default_workspace(),
            collection: default_collection(),
            timeout_secs: default_sink_timeout(),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            enabled: Vec::new(),
            max_commits: default_max_commits(),
            consecutive_failures: default_consecutive_failures(),
            flaky_flips: default_flaky_flips(),
            red_ratio: default_red_ratio(),
            red_min_jobs: default_red_min_jobs(),
            stale_after_mins: default_stale_after_mins(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_ms: default_backoff_max(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            marker_path: None,
            marker_poll_ms: default_marker_poll(),
        }
    }
}

// --- AppConfig methods ---

impl AppConfig {
    /// Load config from the default path. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined,
    /// the file cannot be read, or the TOML content is invalid.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML content is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("ci-alerts").join("config.toml"))
    }

    /// Replaces the target fields that were given on the command line or
    /// through `CI_ALERTS_*`.
    pub fn override_target(
        &mut self,
        organization: Option<&str>,
        repo: Option<&str>,
        branch: Option<&str>,
    ) {
        if let Some(org) = organization {
            self.target.organization = org.to_string();
        }
        if let Some(repo) = repo {
            self.target.repo = repo.to_string();
        }
        if let Some(branch) = branch {
            self.target.branch = branch.to_string();
        }
    }

    /// Rejects settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.target.organization.trim().is_empty() {
            bail!("target.organization must not be empty");
        }
        if self.target.repo.trim().is_empty() {
            bail!("target.repo must not be empty");
        }
        if self.target.branch.trim().is_empty() {
            bail!("target.branch must not be empty");
        }
        if self.source.kind == SourceKind::File && self.source.path.is_none() {
            bail!("source.path is required when source.kind = \"file\"");
        }
        if self.source.timeout_secs == 0 || self.sink.timeout_secs == 0 {
            bail!("timeouts must be at least one second");
        }
        if self.upload.max_attempts == 0 {
            bail!("upload.max_attempts must be at least 1");
        }
        Ok(())
    }

    #[must_use]
    pub fn namespace(&self) -> SinkNamespace {
        SinkNamespace {
            organization: self.target.organization.clone(),
            repo: self.target.repo.clone(),
        }
    }
}

/// Largest stale window, in minutes, that still fits a chrono `Duration`.
const MAX_STALE_AFTER_MINS: i64 = i64::MAX / 60_000;

impl From<&RulesConfig> for RuleThresholds {
    fn from(config: &RulesConfig) -> Self {
        let max_commits = config.max_commits.max(1);
        Self {
            max_commits,
            consecutive_failures: config.consecutive_failures.clamp(1, max_commits),
            flaky_flips: config.flaky_flips.max(1),
            red_ratio: config.red_ratio.clamp(0.01, 1.0),
            red_min_jobs: config.red_min_jobs.max(1),
            stale_after_mins: config.stale_after_mins.clamp(1, MAX_STALE_AFTER_MINS),
        }
    }
}

/// Credential read from the environment. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

/// Credentials for the data source and the sink.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub sink_api_key: Option<Secret>,
    pub source_token: Option<Secret>,
}

impl Credentials {
    /// Reads credentials through `lookup`, ignoring blank values.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .map(Secret::new)
        };
        Self {
            sink_api_key: read(ENV_SINK_API_KEY),
            source_token: read(ENV_SOURCE_TOKEN),
        }
    }
}

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use super::hud_payload::parse_hud_payload;
use crate::domain::entities::signal::SignalSnapshot;
use crate::domain::ports::data_source::{DataSourceError, SignalSource};

/// Reads a recorded HUD response from disk.
pub struct FileSource {
    path: PathBuf,
    branch: String,
}

impl FileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, branch: &str) -> Self {
        Self {
            path: path.into(),
            branch: branch.to_string(),
        }
    }
}

#[async_trait]
impl SignalSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self) -> Result<SignalSnapshot, DataSourceError> {
        let body = tokio::fs::read(&self.path).await.map_err(|e| {
            DataSourceError::Unreachable(format!("cannot read {}: {e}", self.path.display()))
        })?;
        parse_hud_payload(&body, &self.branch, Utc::now())
    }
}

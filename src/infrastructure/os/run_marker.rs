use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// File holding the id of the newest run. A run that finds a different id in
/// it has been superseded and must stop.
pub struct RunMarker {
    path: PathBuf,
    run_id: Uuid,
}

impl RunMarker {
    /// Record `run_id` as the newest run, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the marker directory or file cannot be written.
    pub fn claim(path: impl Into<PathBuf>, run_id: Uuid) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, run_id.to_string())?;
        tracing::debug!(run_id = %run_id, path = %path.display(), "run marker claimed");
        Ok(Self { path, run_id })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the marker still names this run. Runs never delete the
    /// marker, so a missing or unreadable one does not count as being
    /// superseded.
    #[must_use]
    pub fn is_current(&self) -> bool {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => content.trim() == self.run_id.to_string(),
            Err(_) => true,
        }
    }

    /// Poll the marker every `interval` and cancel `token` once another run
    /// has claimed it. The task ends when the token is cancelled.
    pub fn watch(
        &self,
        token: CancellationToken,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let marker = Self {
            path: self.path.clone(),
            run_id: self.run_id,
        };
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !marker.is_current() {
                            tracing::warn!(
                                run_id = %marker.run_id,
                                "newer run detected, cancelling"
                            );
                            token.cancel();
                            break;
                        }
                    }
                }
            }
        })
    }
}

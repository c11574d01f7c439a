use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::application::config::UploadConfig;
use crate::domain::entities::alert::AlertBatch;
use crate::domain::ports::sink::{AlertSink, DeliveryError, SinkNamespace};

#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error("upload cancelled by a newer run before delivery")]
    Cancelled,
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadResult {
    pub delivered: usize,
    /// Network calls made; zero for an empty batch
    pub attempts: u32,
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl From<&UploadConfig> for RetryPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms.max(config.backoff_base_ms)),
        }
    }
}

/// Delivers a batch to the sink as a single unit, retrying transient failures.
pub struct AlertUploader<'a> {
    sink: &'a dyn AlertSink,
    namespace: &'a SinkNamespace,
    policy: RetryPolicy,
    call_timeout: Duration,
}

impl<'a> AlertUploader<'a> {
    #[must_use]
    pub const fn new(
        sink: &'a dyn AlertSink,
        namespace: &'a SinkNamespace,
        policy: RetryPolicy,
        call_timeout: Duration,
    ) -> Self {
        Self {
            sink,
            namespace,
            policy,
            call_timeout,
        }
    }

    /// Upload `batch`. An empty batch succeeds without calling the sink.
    ///
    /// Cancellation is honoured before every network call and while backing
    /// off. A call already in flight is allowed to finish, since the batch is
    /// one unit and the sink upserts by key.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Cancelled` if `cancel` fires before delivery
    /// succeeds, `DeliveryError::Rejected` for a permanent refusal, and
    /// `DeliveryError::Exhausted` once the retry budget is spent.
    pub async fn upload(
        &self,
        batch: &AlertBatch,
        cancel: &CancellationToken,
    ) -> Result<UploadResult, UploadError> {
        if batch.is_empty() {
            tracing::info!("empty batch, nothing to upload");
            return Ok(UploadResult {
                delivered: 0,
                attempts: 0,
            });
        }

        let mut last_err = None;
        for attempt in 1..=self.policy.max_attempts {
            if cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }

            let result = tokio::time::timeout(
                self.call_timeout,
                self.sink.deliver(self.namespace, batch),
            )
            .await
            .unwrap_or_else(|_| Err(DeliveryError::Timeout(self.call_timeout.as_secs())));

            match result {
                Ok(()) => {
                    tracing::info!(
                        sink = self.sink.name(),
                        attempt,
                        records = batch.len(),
                        "batch delivered"
                    );
                    return Ok(UploadResult {
                        delivered: batch.len(),
                        attempts: attempt,
                    });
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(
                        sink = self.sink.name(),
                        attempt,
                        error = %e,
                        "delivery failed, retrying"
                    );
                    last_err = Some(e);
                }
                Err(e) => {
                    tracing::error!(
                        sink = self.sink.name(),
                        attempt,
                        error = %e,
                        "delivery rejected"
                    );
                    return Err(e.into());
                }
            }

            if attempt < self.policy.max_attempts {
                let delay = self.policy.delay_after(attempt);
                tokio::select! {
                    () = cancel.cancelled() => return Err(UploadError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }

        let last = last_err.map_or_else(|| "no attempt made".to_string(), |e| e.to_string());
        tracing::error!(
            sink = self.sink.name(),
            attempts = self.policy.max_attempts,
            "delivery failed after {} attempt(s)",
            self.policy.max_attempts
        );
        Err(DeliveryError::Exhausted {
            attempts: self.policy.max_attempts,
            last,
        }
        .into())
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::alert::AlertBatch;

#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Network failure, 5xx or throttling; worth another attempt.
    #[error("transient delivery failure: {0}")]
    Transient(String),
    /// The sink refused the batch; retrying will not help.
    #[error("sink rejected batch: status={status}, body={body}")]
    Rejected { status: u16, body: String },
    #[error("sink timed out after {0}s")]
    Timeout(u64),
    #[error("delivery failed after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: String },
}

impl DeliveryError {
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Timeout(_))
    }
}

/// Organization/repository pair every delivered record is tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkNamespace {
    pub organization: String,
    pub repo: String,
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &str;

    /// Deliver the whole batch as one unit. Called only with non-empty batches.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Transient` or `DeliveryError::Timeout` for
    /// failures a retry may fix, `DeliveryError::Rejected` otherwise.
    async fn deliver(
        &self,
        namespace: &SinkNamespace,
        batch: &AlertBatch,
    ) -> Result<(), DeliveryError>;
}

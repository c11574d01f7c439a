use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::entities::alert::AlertBatch;
use crate::domain::ports::sink::{AlertSink, DeliveryError, SinkNamespace};

/// Keeps every delivered batch in memory. Optionally fails the first calls
/// with a transient error.
pub struct RecordingSink {
    fail_first: usize,
    calls: Mutex<usize>,
    delivered: Mutex<Vec<(SinkNamespace, AlertBatch)>>,
}

impl RecordingSink {
    #[must_use]
    pub const fn new() -> Self {
        Self::failing(0)
    }

    #[must_use]
    pub const fn failing(fail_first: usize) -> Self {
        Self {
            fail_first,
            calls: Mutex::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    /// Number of `deliver` calls, successful or not.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().map_or(0, |c| *c)
    }

    #[must_use]
    pub fn delivered(&self) -> Vec<(SinkNamespace, AlertBatch)> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(
        &self,
        namespace: &SinkNamespace,
        batch: &AlertBatch,
    ) -> Result<(), DeliveryError> {
        let call = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|e| DeliveryError::Transient(format!("lock poisoned: {e}")))?;
            *calls += 1;
            *calls
        };
        if call <= self.fail_first {
            return Err(DeliveryError::Transient(format!("simulated failure #{call}")));
        }
        self.delivered
            .lock()
            .map_err(|e| DeliveryError::Transient(format!("lock poisoned: {e}")))?
            .push((namespace.clone(), batch.clone()));
        Ok(())
    }
}

use async_trait::async_trait;

use super::ingest::IngestSink;
use crate::domain::entities::alert::AlertBatch;
use crate::domain::ports::sink::{AlertSink, DeliveryError, SinkNamespace};

/// Prints the request body a real upload would send. Used by `--dry-run`.
pub struct StdoutSink;

#[async_trait]
impl AlertSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn deliver(
        &self,
        namespace: &SinkNamespace,
        batch: &AlertBatch,
    ) -> Result<(), DeliveryError> {
        let body = IngestSink::body(namespace, batch);
        let text = serde_json::to_string_pretty(&body)
            .map_err(|e| DeliveryError::Rejected {
                status: 0,
                body: format!("cannot serialize batch: {e}"),
            })?;
        println!("{text}");
        Ok(())
    }
}

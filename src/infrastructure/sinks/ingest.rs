use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::application::config::Secret;
use crate::domain::entities::alert::{AlertBatch, AlertRecord};
use crate::domain::ports::sink::{AlertSink, DeliveryError, SinkNamespace};

/// Maximum response bytes kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// Uploads batches to a document-ingest collection, one request per batch.
///
/// Documents use the alert key as `_id`, so re-sending a condition replaces
/// the previous document instead of duplicating it.
pub struct IngestSink {
    url: String,
    client: reqwest::Client,
    api_key: Secret,
    timeout_secs: u64,
}

impl IngestSink {
    /// Creates a sink posting to
    /// `{base_url}/v1/orgs/self/ws/{workspace}/collections/{collection}/docs`.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be initialized.
    pub fn new(
        base_url: &str,
        workspace: &str,
        collection: &str,
        api_key: Secret,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("ci-alerts/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            url: format!(
                "{}/v1/orgs/self/ws/{workspace}/collections/{collection}/docs",
                base_url.trim_end_matches('/')
            ),
            client,
            api_key,
            timeout_secs,
        })
    }

    fn document(namespace: &SinkNamespace, record: &AlertRecord) -> Value {
        json!({
            "_id": &record.key,
            "organization": &namespace.organization,
            "repo": &namespace.repo,
            "key": &record.key,
            "severity": record.severity,
            "category": record.category,
            "payload": &record.payload,
            "detected_at": record.detected_at.to_rfc3339(),
        })
    }

    /// Request body for a whole batch.
    #[must_use]
    pub fn body(namespace: &SinkNamespace, batch: &AlertBatch) -> Value {
        let data: Vec<Value> = batch
            .iter()
            .map(|record| Self::document(namespace, record))
            .collect();
        json!({ "data": data })
    }

    fn classify_status(status: u16, body: String) -> DeliveryError {
        if status == 408 || status == 429 || status >= 500 {
            DeliveryError::Transient(format!("HTTP {status}: {body}"))
        } else {
            DeliveryError::Rejected { status, body }
        }
    }
}

fn truncate(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("...");
    }
    s
}

#[async_trait]
impl AlertSink for IngestSink {
    fn name(&self) -> &str {
        "ingest"
    }

    async fn deliver(
        &self,
        namespace: &SinkNamespace,
        batch: &AlertBatch,
    ) -> Result<(), DeliveryError> {
        let resp = self
            .client
            .post(&self.url)
            .header("Authorization", format!("ApiKey {}", self.api_key.expose()))
            .json(&Self::body(namespace, batch))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout(self.timeout_secs)
                } else {
                    DeliveryError::Transient(e.to_string())
                }
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = truncate(resp.text().await.unwrap_or_default(), MAX_ERROR_BODY);
        Err(Self::classify_status(status.as_u16(), body))
    }
}

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::hud_payload::parse_hud_payload;
use crate::application::config::Secret;
use crate::domain::entities::signal::SignalSnapshot;
use crate::domain::ports::data_source::{DataSourceError, SignalSource};

/// Maximum accepted response body (16 MB).
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Reads the commit/job grid of a branch from a HUD endpoint.
pub struct HudSource {
    url: String,
    branch: String,
    client: reqwest::Client,
    token: Option<Secret>,
    timeout_secs: u64,
}

impl HudSource {
    /// Creates a source for `{base_url}/api/hud/{organization}/{repo}/{branch}/0`.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be initialized
    /// (e.g. TLS backend failure).
    pub fn new(
        base_url: &str,
        organization: &str,
        repo: &str,
        branch: &str,
        token: Option<Secret>,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("ci-alerts/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            url: Self::endpoint(base_url, organization, repo, branch),
            branch: branch.to_string(),
            client,
            token,
            timeout_secs,
        })
    }

    fn endpoint(base_url: &str, organization: &str, repo: &str, branch: &str) -> String {
        format!(
            "{}/api/hud/{organization}/{repo}/{branch}/0",
            base_url.trim_end_matches('/')
        )
    }

    fn classify(&self, e: &reqwest::Error) -> DataSourceError {
        if e.is_timeout() {
            DataSourceError::Timeout(self.timeout_secs)
        } else if e.is_decode() {
            DataSourceError::Malformed(e.to_string())
        } else {
            DataSourceError::Unreachable(e.to_string())
        }
    }
}

fn check_body_size(len: usize, max: usize) -> Result<(), DataSourceError> {
    if len > max {
        return Err(DataSourceError::Malformed(format!(
            "response too large: more than {max} bytes ({len})"
        )));
    }
    Ok(())
}

/// Appends `chunk` unless the body would grow past `max` bytes.
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], max: usize) -> Result<(), DataSourceError> {
    check_body_size(body.len().saturating_add(chunk.len()), max)?;
    body.extend_from_slice(chunk);
    Ok(())
}

#[async_trait]
impl SignalSource for HudSource {
    fn name(&self) -> &str {
        "hud"
    }

    async fn fetch(&self) -> Result<SignalSnapshot, DataSourceError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose());
        }

        let mut resp = request.send().await.map_err(|e| self.classify(&e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DataSourceError::Unreachable(format!(
                "HUD returned HTTP {status}"
            )));
        }

        let mut body = match resp.content_length() {
            Some(len) => {
                let len = usize::try_from(len).unwrap_or(usize::MAX);
                check_body_size(len, MAX_BODY_BYTES)?;
                Vec::with_capacity(len)
            }
            None => Vec::new(),
        };
        while let Some(chunk) = resp.chunk().await.map_err(|e| self.classify(&e))? {
            append_capped(&mut body, &chunk, MAX_BODY_BYTES)?;
        }
        tracing::debug!(bytes = body.len(), "HUD response received");

        parse_hud_payload(&body, &self.branch, Utc::now())
    }
}

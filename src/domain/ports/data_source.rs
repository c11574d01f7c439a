use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::signal::SignalSnapshot;

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("data source unreachable: {0}")]
    Unreachable(String),
    #[error("malformed data from source: {0}")]
    Malformed(String),
    #[error("data source timed out after {0}s")]
    Timeout(u64),
}

#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &str;

    /// Fetch the current CI signal for the configured branch.
    ///
    /// # Errors
    ///
    /// Returns `DataSourceError` if the source cannot be reached, answers with
    /// data that does not parse, or does not answer in time.
    async fn fetch(&self) -> Result<SignalSnapshot, DataSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_source_error_display() {
        let err = DataSourceError::Unreachable("connection refused".to_string());
        assert_eq!(err.to_string(), "data source unreachable: connection refused");

        let err = DataSourceError::Timeout(30);
        assert_eq!(err.to_string(), "data source timed out after 30s");
    }
}

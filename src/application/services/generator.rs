use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::entities::alert::AlertBatch;
use crate::domain::ports::data_source::{DataSourceError, SignalSource};
use crate::domain::rules::RuleEngine;
use crate::domain::value_objects::thresholds::RuleThresholds;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error("generation cancelled by a newer run")]
    Cancelled,
}

/// Fetches CI signal and turns it into an ordered, deduplicated alert batch.
///
/// Generation never touches the sink. An empty batch means nothing to report.
pub struct AlertGenerator<'a> {
    source: &'a dyn SignalSource,
    rule_engine: &'a RuleEngine,
    thresholds: &'a RuleThresholds,
    fetch_timeout: Duration,
}

impl<'a> AlertGenerator<'a> {
    #[must_use]
    pub const fn new(
        source: &'a dyn SignalSource,
        rule_engine: &'a RuleEngine,
        thresholds: &'a RuleThresholds,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            rule_engine,
            thresholds,
            fetch_timeout,
        }
    }

    /// Run one generation pass.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::Cancelled` if `cancel` fires before or during
    /// the fetch, and `GenerateError::DataSource` if the source fails or does
    /// not answer within the fetch timeout.
    pub async fn generate(&self, cancel: &CancellationToken) -> Result<AlertBatch, GenerateError> {
        if cancel.is_cancelled() {
            return Err(GenerateError::Cancelled);
        }

        tracing::debug!(source = self.source.name(), "fetching CI signal");
        let fetch = tokio::time::timeout(self.fetch_timeout, self.source.fetch());
        let snapshot = tokio::select! {
            () = cancel.cancelled() => return Err(GenerateError::Cancelled),
            result = fetch => result
                .map_err(|_| DataSourceError::Timeout(self.fetch_timeout.as_secs()))??,
        };

        let batch = self.rule_engine.analyze(&snapshot, self.thresholds);
        if batch.is_empty() {
            tracing::info!(
                branch = %snapshot.branch,
                commits = snapshot.commits.len(),
                "signal healthy, no alerts"
            );
        } else {
            tracing::warn!(
                branch = %snapshot.branch,
                alerts = batch.len(),
                "{} alert(s) generated",
                batch.len()
            );
        }
        Ok(batch)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::signal::JobConclusion::TimedOut;
    use crate::domain::entities::signal::SignalSnapshot;
    use crate::domain::rules::default_rules;
    use crate::domain::rules::test_support::{job, make_snapshot};
    use async_trait::async_trait;

    struct FixedSource(SignalSnapshot);

    #[async_trait]
    impl SignalSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn fetch(&self) -> Result<SignalSnapshot, DataSourceError> {
            Ok(self.0.clone())
        }
    }

    struct DownSource;

    #[async_trait]
    impl SignalSource for DownSource {
        fn name(&self) -> &str {
            "down"
        }
        async fn fetch(&self) -> Result<SignalSnapshot, DataSourceError> {
            Err(DataSourceError::Unreachable("connection refused".into()))
        }
    }

    struct HangingSource;

    #[async_trait]
    impl SignalSource for HangingSource {
        fn name(&self) -> &str {
            "hanging"
        }
        async fn fetch(&self) -> Result<SignalSnapshot, DataSourceError> {
            std::future::pending().await
        }
    }

    fn engine() -> RuleEngine {
        RuleEngine::new(default_rules())
    }

    #[tokio::test]
    async fn generates_timeout_alert() {
        let source = FixedSource(make_snapshot(vec![vec![job("job123", TimedOut)]]));
        let engine = engine();
        let thresholds = RuleThresholds::default();
        let generator =
            AlertGenerator::new(&source, &engine, &thresholds, Duration::from_secs(5));

        let batch = generator
            .generate(&CancellationToken::new())
            .await
            .expect("generate");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.records()[0].key, "job123-timeout");
    }

    #[tokio::test]
    async fn unreachable_source_is_data_source_error() {
        let engine = engine();
        let thresholds = RuleThresholds::default();
        let generator =
            AlertGenerator::new(&DownSource, &engine, &thresholds, Duration::from_secs(5));

        let err = generator
            .generate(&CancellationToken::new())
            .await
            .expect_err("should fail");
        assert!(matches!(
            err,
            GenerateError::DataSource(DataSourceError::Unreachable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out() {
        let engine = engine();
        let thresholds = RuleThresholds::default();
        let generator =
            AlertGenerator::new(&HangingSource, &engine, &thresholds, Duration::from_secs(30));

        let err = generator
            .generate(&CancellationToken::new())
            .await
            .expect_err("should time out");
        assert!(matches!(
            err,
            GenerateError::DataSource(DataSourceError::Timeout(30))
        ));
    }

    #[tokio::test]
    async fn cancelled_before_fetch() {
        let engine = engine();
        let thresholds = RuleThresholds::default();
        let generator =
            AlertGenerator::new(&DownSource, &engine, &thresholds, Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = generator.generate(&cancel).await.expect_err("cancelled");
        assert!(matches!(err, GenerateError::Cancelled));
    }
}

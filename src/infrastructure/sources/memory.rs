use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::entities::signal::SignalSnapshot;
use crate::domain::ports::data_source::{DataSourceError, SignalSource};

/// Serves a fixed snapshot, or fails every fetch. Counts calls.
pub struct InMemorySource {
    snapshot: Option<SignalSnapshot>,
    fetches: AtomicUsize,
}

impl InMemorySource {
    #[must_use]
    pub const fn new(snapshot: SignalSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            fetches: AtomicUsize::new(0),
        }
    }

    /// A source whose every fetch fails with `Unreachable`.
    #[must_use]
    pub const fn unreachable() -> Self {
        Self {
            snapshot: None,
            fetches: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self) -> Result<SignalSnapshot, DataSourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .clone()
            .ok_or_else(|| DataSourceError::Unreachable("in-memory source is down".into()))
    }
}

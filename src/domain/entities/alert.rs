use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::value_objects::{AlertCategory, Severity};

/// A detected anomalous condition, keyed for sink-side upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub key: String,
    pub severity: Severity,
    pub category: AlertCategory,
    pub payload: Map<String, Value>,
    pub detected_at: DateTime<Utc>,
}

impl AlertRecord {
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        severity: Severity,
        category: AlertCategory,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            severity,
            category,
            payload: Map::new(),
            detected_at,
        }
    }

    /// Adds a diagnostic field to the payload.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(name.to_string(), value.into());
        self
    }
}

/// Alerts produced by one generation run.
///
/// Keys are unique and records are ordered by severity (highest first), then
/// key. Both hold for every batch because candidates go through
/// [`AlertBatch::from_candidates`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AlertBatch {
    records: Vec<AlertRecord>,
}

impl AlertBatch {
    /// Builds a batch from raw rule output.
    ///
    /// When several candidates share a key, the most recently detected one
    /// wins; on equal timestamps the later candidate wins.
    #[must_use]
    pub fn from_candidates(candidates: Vec<AlertRecord>) -> Self {
        let mut by_key: HashMap<String, AlertRecord> = HashMap::with_capacity(candidates.len());
        for candidate in candidates {
            match by_key.get(&candidate.key) {
                Some(existing) if existing.detected_at > candidate.detected_at => {}
                _ => {
                    by_key.insert(candidate.key.clone(), candidate);
                }
            }
        }

        let mut records: Vec<AlertRecord> = by_key.into_values().collect();
        records.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.key.cmp(&b.key)));
        Self { records }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[AlertRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AlertRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a AlertBatch {
    type Item = &'a AlertRecord;
    type IntoIter = std::slice::Iter<'a, AlertRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

use serde::{Deserialize, Serialize};

/// Classification of the condition an alert describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    RecurrentFailure,
    Timeout,
    Flaky,
    TrunkHealth,
    StaleSignal,
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::RecurrentFailure => "recurrent_failure",
            Self::Timeout => "timeout",
            Self::Flaky => "flaky",
            Self::TrunkHealth => "trunk_health",
            Self::StaleSignal => "stale_signal",
        };
        f.write_str(label)
    }
}

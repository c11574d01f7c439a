pub mod category;
pub mod run_state;
pub mod severity;
pub mod thresholds;

pub use category::AlertCategory;
pub use run_state::RunState;
pub use severity::Severity;
pub use thresholds::RuleThresholds;

pub mod generate;
pub mod run;

use crate::application::config::AppConfig;
use crate::domain::rules::{default_rules, select_rules, RuleEngine};

/// Rule engine with the rules enabled in `config`.
#[must_use]
pub fn build_rule_engine(config: &AppConfig) -> RuleEngine {
    let rules = select_rules(default_rules(), &config.rules.enabled);
    for name in &config.rules.enabled {
        if !rules.iter().any(|r| r.name() == name) {
            tracing::warn!(rule = %name, "unknown rule in config, ignored");
        }
    }
    RuleEngine::new(rules)
}

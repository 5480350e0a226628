//! Configuration for the hierarchy engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::gate::DuplicatePolicy;
use crate::policy::{PromotionRules, RelationPolicy};
use crate::types::Result;

/// Engine configuration, loadable from YAML.
///
/// Omitted tables fall back to the built-in ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Whether duplicated ministries block saving
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// Delay before the relation change dialog opens (ms)
    #[serde(default = "default_debounce_ms")]
    pub confirmation_debounce_ms: u64,
    #[serde(default)]
    pub relation_policy: RelationPolicy,
    #[serde(default)]
    pub promotion_rules: PromotionRules,
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            confirmation_debounce_ms: default_debounce_ms(),
            relation_policy: RelationPolicy::default(),
            promotion_rules: PromotionRules::default(),
        }
    }
}

impl EngineConfig {
    /// Load config from YAML, validating the tables it carries.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the tables this config carries.
    pub fn validate(&self) -> Result<()> {
        self.relation_policy.validate()?;
        self.promotion_rules.validate()?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn confirmation_debounce(&self) -> Duration {
        Duration::from_millis(self.confirmation_debounce_ms)
    }
}

//! Configuration for editing sessions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use hierarchy::{Engine, EngineConfig};

use crate::session::SessionError;

/// Session configuration, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Engine tables and settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// How long fetched option lists are reused (seconds)
    #[serde(default = "default_option_cache_ttl_secs")]
    pub option_cache_ttl_secs: u64,
    /// Save mutation timeout (ms)
    #[serde(default = "default_save_timeout_ms")]
    pub save_timeout_ms: u64,
}

fn default_option_cache_ttl_secs() -> u64 {
    300
}

fn default_save_timeout_ms() -> u64 {
    30_000
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            option_cache_ttl_secs: default_option_cache_ttl_secs(),
            save_timeout_ms: default_save_timeout_ms(),
        }
    }
}

impl EditorConfig {
    /// Load config from YAML, validating the engine tables.
    pub fn from_yaml(yaml: &str) -> Result<Self, SessionError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.engine.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, SessionError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn option_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.option_cache_ttl_secs)
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }

    /// Build the engine this config describes.
    pub fn build_engine(&self) -> Engine {
        Engine::new(self.engine.clone())
    }
}

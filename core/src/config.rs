//! Display configuration
//!
//! Two layers feed a display:
//! - `DisplaySettings` pushed by the remote settings feed (whole-map updates)
//! - `EngineConfig`, the local per-machine configuration persisted with confy
//!
//! `ConfigProvider` supplies the settings a display uses before the feed has
//! delivered anything.

use std::path::{Path, PathBuf};
use std::time::Duration;

use queue_display_types::{DisplaySettings, Scope};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineError;

const APP_NAME: &str = "queue-display";
const CONFIG_NAME: &str = "config";

/// Source of display settings
pub trait ConfigProvider: Send + Sync {
    fn settings(&self) -> DisplaySettings;
}

/// Provider returning a fixed settings value
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    settings: DisplaySettings,
}

impl StaticConfigProvider {
    pub fn new(settings: DisplaySettings) -> Self {
        Self { settings }
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn settings(&self) -> DisplaySettings {
        self.settings.clone()
    }
}

/// Errors during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration from {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: confy::ConfyError,
    },

    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),
}

fn default_scope() -> String {
    "all".to_string()
}

fn default_cache_refresh_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Local configuration for one display machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Department name or "all"
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Snapshot directory, platform cache dir when unset
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// How often the offline snapshot is refreshed while online
    #[serde(default = "default_cache_refresh_secs")]
    pub cache_refresh_secs: u64,

    /// Whether the host plays audio without a user gesture
    #[serde(default = "default_true")]
    pub platform_allows_audio: bool,

    /// Settings used until the settings feed delivers
    #[serde(default)]
    pub local_settings: DisplaySettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            cache_dir: None,
            cache_refresh_secs: default_cache_refresh_secs(),
            platform_allows_audio: true,
            local_settings: DisplaySettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn scope(&self) -> Scope {
        Scope::parse(&self.scope)
    }

    pub fn cache_refresh(&self) -> Duration {
        Duration::from_secs(self.cache_refresh_secs)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.cache_refresh_secs == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "cache_refresh_secs must be greater than zero".to_string(),
            });
        }
        if self.local_settings.audio.volume > 100 {
            return Err(EngineError::InvalidConfig {
                reason: format!("volume {} exceeds 100", self.local_settings.audio.volume),
            });
        }
        Ok(())
    }
}

impl ConfigProvider for EngineConfig {
    fn settings(&self) -> DisplaySettings {
        self.local_settings.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EngineConfig Persistence
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for EngineConfig persistence
pub trait EngineConfigExt: Sized {
    fn load() -> Self;
    fn load_from(path: &Path) -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn save_to(&self, path: &Path) -> Result<(), ConfigError>;
}

impl EngineConfigExt for EngineConfig {
    fn load() -> Self {
        confy::load(APP_NAME, CONFIG_NAME).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load engine config, using defaults");
            Self::default()
        })
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        confy::load_path(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        confy::store_path(path, self).map_err(ConfigError::Save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scope(), Scope::All);
        assert_eq!(config.cache_refresh(), Duration::from_secs(30));
    }

    #[test]
    fn zero_refresh_is_rejected() {
        let config = EngineConfig {
            cache_refresh_secs: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn load_from_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("display.toml");
        std::fs::write(&path, "scope = \"Lab\"\ncache_refresh_secs = 10\n").unwrap();

        let config = EngineConfig::load_from(&path).unwrap();
        assert_eq!(config.scope(), Scope::Department("Lab".to_string()));
        assert_eq!(config.cache_refresh_secs, 10);
        assert!(config.platform_allows_audio);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("display.toml");
        let mut config = EngineConfig {
            scope: "Radiology".to_string(),
            cache_refresh_secs: 15,
            platform_allows_audio: false,
            ..EngineConfig::default()
        };
        config.local_settings.hospital_name = "St. Mary".to_string();
        config.local_settings.audio.volume = 40;

        config.save_to(&path).unwrap();
        let loaded = EngineConfig::load_from(&path).unwrap();
        assert_eq!(loaded.scope(), Scope::Department("Radiology".to_string()));
        assert_eq!(loaded.cache_refresh_secs, 15);
        assert!(!loaded.platform_allows_audio);
        assert_eq!(loaded.local_settings, config.local_settings);
    }
}

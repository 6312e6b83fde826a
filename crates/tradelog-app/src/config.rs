//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tradelog_engine::EngineConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "TRADELOG_CONFIG";

/// Config file used when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Where the last-used filter and sort are kept between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Disable to run without persistence.
    #[serde(default = "default_storage_enabled")]
    pub enabled: bool,
    /// Directory holding one JSON file per key.
    #[serde(default = "default_storage_dir")]
    pub dir: String,
}

fn default_storage_enabled() -> bool {
    true
}

fn default_storage_dir() -> String {
    "./data/state".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: default_storage_enabled(),
            dir: default_storage_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl AppConfig {
    /// Resolve the config path (`explicit` > `TRADELOG_CONFIG` > default)
    /// and load it. A missing file yields defaults.
    pub fn load(explicit: Option<&str>) -> AppResult<Self> {
        let config_path = explicit
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.engine
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        if self.storage.enabled && self.storage.dir.trim().is_empty() {
            return Err(AppError::Config("storage.dir must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradelog_core::PageSize;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.storage.enabled);
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.telemetry.log_filter.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [engine]
            debounce_text_ms = 250
            default_page_size = 50

            [storage]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.debounce_text_ms, 250);
        assert_eq!(config.engine.debounce_discrete_ms, 100);
        assert_eq!(config.engine.default_page_size, PageSize::Fifty);
        assert!(!config.storage.enabled);
        assert_eq!(config.storage.dir, "./data/state");
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = toml::to_string(&AppConfig::default()).unwrap();
        assert!(toml_str.contains("debounce_text_ms"));
        assert!(toml_str.contains("[storage]"));
    }

    #[test]
    fn test_from_file_rejects_invalid_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[engine]\ncache_capacity = 0\n").unwrap();
        let err = AppConfig::from_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load(Some("/nonexistent/tradelog.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}

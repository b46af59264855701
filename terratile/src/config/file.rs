//! Configuration file handling.
//!
//! Parsing lives in [`super::parser`], serialization in [`super::writer`].

use super::settings::TerraTileConfig;
use crate::error::TerraError;
use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl From<ConfigError> for TerraError {
    fn from(err: ConfigError) -> Self {
        TerraError::Configuration(err.to_string())
    }
}

impl TerraTileConfig {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}

/// Get the path to the config directory (`<config dir>/terratile`).
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("terratile")
}

/// Get the path to the config file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ElevationConfig, NetworkConfig, StoreConfig};
    use crate::elevation::GroupingStrategy;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp = TempDir::new().unwrap();
        let config = TerraTileConfig::load_from(&temp.path().join("missing.ini")).unwrap();
        assert_eq!(config, TerraTileConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let config = TerraTileConfig::new()
            .with_store(
                StoreConfig::new()
                    .with_root(temp.path().join("store"))
                    .with_read_only(true)
                    .with_max_concurrent_io(3),
            )
            .with_network(
                NetworkConfig::new()
                    .with_timeout_secs(12)
                    .with_imagery_url("https://img.example.com/{quadkey}.jpg"),
            )
            .with_elevation(
                ElevationConfig::new()
                    .with_default_level(9)
                    .with_strategy(GroupingStrategy::FewestTiles)
                    .with_scratch_buffers(2),
            );

        config.save_to(&path).unwrap();
        let loaded = TerraTileConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_value_converts_to_configuration_error() {
        let err: TerraError = ConfigError::InvalidValue {
            section: "store".to_string(),
            key: "max_concurrent_io".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        }
        .into();
        assert!(matches!(err, TerraError::Configuration(ref msg) if msg.contains("store.max_concurrent_io")));
    }

    #[test]
    fn test_config_file_path() {
        assert!(config_file_path().ends_with("terratile/config.ini"));
    }
}

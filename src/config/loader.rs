use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },

    #[error("No primary URL configured for profile '{profile}'")]
    MissingPrimary { profile: String },

    #[error("Unknown profile '{value}' (expected 'development' or 'production')")]
    UnknownProfile { value: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/failover-client/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("failover-client").join("config.toml")
    }

    /// Default location of the persisted routing state.
    pub fn default_state_path() -> PathBuf {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        data_dir.join("failover-client").join("state.toml")
    }

    /// Path of the persisted routing state, honouring `client.state_path`.
    pub fn state_path(&self) -> PathBuf {
        self.client
            .state_path
            .clone()
            .unwrap_or_else(Self::default_state_path)
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file yields an empty config; `resolve` then reports
    /// the missing primary for whichever profile is requested.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load_from(&path)
    }

    /// Loads and validates configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The health probe timeout is non-zero
    /// - The health path is absolute
    /// - The storage key is non-empty
    /// - Every profile has a non-zero request timeout longer than the probe timeout
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.health_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "health_timeout_ms must be greater than zero".to_string(),
            });
        }

        if !self.client.health_path.starts_with('/') {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "health_path '{}' must start with '/'",
                    self.client.health_path
                ),
            });
        }

        if self.client.storage_key.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "storage_key must not be empty".to_string(),
            });
        }

        for (name, profile) in &self.profiles {
            if profile.timeout_ms == 0 {
                return Err(ConfigError::ValidationError {
                    message: format!("Profile '{}' has timeout_ms = 0", name),
                });
            }
            if profile.timeout_ms <= self.client.health_timeout_ms {
                return Err(ConfigError::ValidationError {
                    message: format!(
                        "Profile '{}' timeout_ms ({}) must exceed health_timeout_ms ({})",
                        name, profile.timeout_ms, self.client.health_timeout_ms
                    ),
                });
            }
        }

        Ok(())
    }
}

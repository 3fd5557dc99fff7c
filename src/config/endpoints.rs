//! Endpoint resolution for the active runtime profile.
//!
//! Turns the loaded [`Config`] into the immutable [`EndpointSet`] the
//! client is built from. Resolution happens once at start-up.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::loader::ConfigError;
use crate::config::types::Config;

/// Env var selecting the runtime profile.
pub const PROFILE_ENV_VAR: &str = "FAILOVER_ENV";
/// Env var overriding the primary base URL of the selected profile.
pub const PRIMARY_ENV_VAR: &str = "FAILOVER_PRIMARY_URL";
/// Env var overriding the backup base URL of the selected profile.
pub const BACKUP_ENV_VAR: &str = "FAILOVER_BACKUP_URL";
/// Env var overriding the request timeout of the selected profile.
pub const TIMEOUT_ENV_VAR: &str = "FAILOVER_TIMEOUT_MS";

/// Runtime configuration profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    Development,
    #[default]
    Production,
}

impl Profile {
    /// Key used for this profile under `[profiles]`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Production => "production",
        }
    }

    /// Pick the active profile.
    ///
    /// Precedence: explicit value, then `FAILOVER_ENV`, then the config's
    /// `profile` key, then production.
    pub fn select(explicit: Option<&str>, config: &Config) -> Result<Self, ConfigError> {
        if let Some(value) = explicit {
            return value.parse();
        }
        if let Ok(value) = std::env::var(PROFILE_ENV_VAR) {
            if !value.trim().is_empty() {
                return value.parse();
            }
        }
        match config.profile.as_deref() {
            Some(value) => value.parse(),
            None => Ok(Profile::default()),
        }
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            _ => Err(ConfigError::UnknownProfile {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two base URLs and request timeout the client routes between.
///
/// Immutable after construction. An empty `backup` means no backup is
/// configured and is treated as permanently unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet {
    pub primary: String,
    pub backup: String,
    pub timeout_ms: u64,
}

impl EndpointSet {
    /// Build an endpoint set, trimming trailing slashes from both URLs.
    ///
    /// # Errors
    /// Returns `MissingPrimary` for an empty primary and `ValidationError`
    /// for a zero timeout.
    pub fn new(
        primary: impl Into<String>,
        backup: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self, ConfigError> {
        let primary = normalize_base_url(&primary.into());
        let backup = normalize_base_url(&backup.into());

        if primary.is_empty() {
            return Err(ConfigError::MissingPrimary {
                profile: "<explicit>".to_string(),
            });
        }
        if timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "timeout_ms must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            primary,
            backup,
            timeout_ms,
        })
    }

    pub fn has_backup(&self) -> bool {
        !self.backup.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Resolve the endpoint set for `profile` from this config alone.
    ///
    /// # Errors
    /// `MissingPrimary` when the profile is absent or has no primary URL.
    pub fn resolve(&self, profile: Profile) -> Result<EndpointSet, ConfigError> {
        let entry = self
            .profiles
            .get(profile.as_str())
            .ok_or_else(|| ConfigError::MissingPrimary {
                profile: profile.to_string(),
            })?;

        EndpointSet::new(&entry.primary, &entry.backup, entry.timeout_ms).map_err(|e| match e {
            ConfigError::MissingPrimary { .. } => ConfigError::MissingPrimary {
                profile: profile.to_string(),
            },
            other => other,
        })
    }

    /// Apply `FAILOVER_PRIMARY_URL`, `FAILOVER_BACKUP_URL` and
    /// `FAILOVER_TIMEOUT_MS` to the entry for `profile`, creating it if needed.
    pub fn apply_env_overrides(&mut self, profile: Profile) -> Result<(), ConfigError> {
        let primary = std::env::var(PRIMARY_ENV_VAR).ok();
        let backup = std::env::var(BACKUP_ENV_VAR).ok();
        let timeout = std::env::var(TIMEOUT_ENV_VAR).ok();

        if primary.is_none() && backup.is_none() && timeout.is_none() {
            return Ok(());
        }

        let entry = self
            .profiles
            .entry(profile.as_str().to_string())
            .or_default();

        if let Some(primary) = primary {
            entry.primary = primary;
        }
        if let Some(backup) = backup {
            entry.backup = backup;
        }
        if let Some(timeout) = timeout {
            entry.timeout_ms = timeout.trim().parse().map_err(|_| ConfigError::ValidationError {
                message: format!("{} must be an integer, got '{}'", TIMEOUT_ENV_VAR, timeout),
            })?;
        }

        tracing::debug!(profile = %profile, "Applied environment overrides");
        Ok(())
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

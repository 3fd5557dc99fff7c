use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Profile used when neither the CLI nor `FAILOVER_ENV` picks one.
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub client: ClientConfig,
    /// Endpoint definitions keyed by profile name ("development", "production").
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

/// Settings shared by every profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Liveness sub-path probed on each base URL (default: "/health").
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// Ceiling for a single health probe in milliseconds (default: 3000).
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
    /// Key under which the failed-over flag is persisted (default: "api_failover").
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Location of the persisted state file. Defaults to the platform data dir.
    #[serde(default)]
    pub state_path: Option<PathBuf>,
}

/// Endpoints for one runtime profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Base URL of the primary backend.
    #[serde(default)]
    pub primary: String,
    /// Base URL of the backup backend. Empty means no backup.
    #[serde(default)]
    pub backup: String,
    /// Request timeout in milliseconds (default: 15000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_health_timeout_ms() -> u64 {
    3000
}

fn default_storage_key() -> String {
    "api_failover".to_string()
}

fn default_timeout_ms() -> u64 {
    15000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            health_path: default_health_path(),
            health_timeout_ms: default_health_timeout_ms(),
            storage_key: default_storage_key(),
            state_path: None,
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            primary: String::new(),
            backup: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

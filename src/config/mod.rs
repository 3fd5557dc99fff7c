//! Configuration loading and endpoint resolution.

mod endpoints;
mod loader;
mod types;

pub use endpoints::{
    EndpointSet, Profile, BACKUP_ENV_VAR, PRIMARY_ENV_VAR, PROFILE_ENV_VAR, TIMEOUT_ENV_VAR,
};
pub use loader::ConfigError;
pub use types::{ClientConfig, Config, ProfileConfig};

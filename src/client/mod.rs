pub mod error;
pub mod health;
pub mod init;
pub mod request;
pub mod router;
pub mod upstream;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing_subscriber::EnvFilter;

use crate::backend::{FileStore, RoutingState, StateStore};
use crate::client::error::ClientError;
use crate::client::health::HealthProber;
use crate::client::router::RequestRouter;
use crate::client::upstream::UpstreamClient;
use crate::config::{Config, Profile};

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();
}

/// Build a router for `profile` persisting to the config's state file.
///
/// The router is not yet initialized; see [`bootstrap`].
pub fn build(config: &Config, profile: Profile) -> Result<RequestRouter, ClientError> {
    let store: Arc<dyn StateStore> = Arc::new(FileStore::new(config.state_path()));
    build_with_store(config, profile, store)
}

/// Build a router for `profile` on top of an explicit state store.
pub fn build_with_store(
    config: &Config,
    profile: Profile,
    store: Arc<dyn StateStore>,
) -> Result<RequestRouter, ClientError> {
    let endpoints = config.resolve(profile)?;

    let client = Client::builder()
        .connect_timeout(endpoints.timeout())
        .build()
        .map_err(ClientError::HttpClient)?;

    let prober = HealthProber::new(
        client.clone(),
        config.client.health_path.clone(),
        Duration::from_millis(config.client.health_timeout_ms),
    );
    let upstream = UpstreamClient::new(client);

    tracing::info!(
        profile = %profile,
        primary = %endpoints.primary,
        backup = %endpoints.backup,
        timeout_ms = endpoints.timeout_ms,
        "Endpoints resolved"
    );

    let state = RoutingState::new(endpoints, store, config.client.storage_key.clone());
    Ok(RequestRouter::new(state, prober, upstream))
}

/// Build a router and run start-up reconciliation before returning it.
pub async fn bootstrap(config: &Config, profile: Profile) -> Result<RequestRouter, ClientError> {
    let router = build(config, profile)?;
    let route = router.initialize().await;
    tracing::info!(route = %route, endpoint = %router.state().current(), "Client ready");
    Ok(router)
}

//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use failover_client::backend::{MemoryStore, Notification, RoutingState, StateStore};
use failover_client::client::health::HealthProber;
use failover_client::client::upstream::UpstreamClient;
use failover_client::{EndpointSet, RequestRouter};
use parking_lot::Mutex;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const STORAGE_KEY: &str = "api_failover";

/// Base URL of a port nothing listens on.
pub fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to free port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Router over an in-memory store with short timeouts.
pub fn make_router(primary: &str, backup: &str, timeout_ms: u64) -> (RequestRouter, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let router = make_router_with_store(primary, backup, timeout_ms, store.clone());
    (router, store)
}

pub fn make_router_with_store(
    primary: &str,
    backup: &str,
    timeout_ms: u64,
    store: Arc<dyn StateStore>,
) -> RequestRouter {
    let endpoints = EndpointSet::new(primary, backup, timeout_ms).unwrap();
    let state = RoutingState::new(endpoints, store, STORAGE_KEY);
    let prober = HealthProber::new(reqwest::Client::new(), "/health", Duration::from_millis(300));
    RequestRouter::new(state, prober, UpstreamClient::default())
}

/// Record every notification emitted by `state`.
pub fn record_notifications(state: &RoutingState) -> Arc<Mutex<Vec<Notification>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    state.subscribe(move |n| sink.lock().push(n.clone()));
    seen
}

/// Poll `cond` until it holds or `timeout` elapses.
pub async fn wait_until<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// Write a config file with one production profile and a state file
/// inside the returned temp dir.
pub fn temp_config(primary: &str, backup: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    let state_path = temp_dir.path().join("state.toml");

    let content = format!(
        r#"profile = "production"

[client]
health_timeout_ms = 300
state_path = "{}"

[profiles.production]
primary = "{}"
backup = "{}"
timeout_ms = 1000
"#,
        state_path.display().to_string().replace('\\', "\\\\"),
        primary,
        backup
    );

    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}

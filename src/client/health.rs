//! Liveness probing of a base URL.

use std::time::Duration;

use reqwest::Client;
use tokio::time;

/// Default ceiling for a single probe.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_millis(3000);

/// Issues bounded `GET {base}/health` checks. Never fails; failure is `false`.
#[derive(Clone)]
pub struct HealthProber {
    client: Client,
    path: String,
    timeout: Duration,
}

impl HealthProber {
    pub fn new(client: Client, path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            path: path.into(),
            timeout,
        }
    }

    /// Returns `true` only for a 2xx answer within the probe timeout.
    ///
    /// An empty `base_url` means "no endpoint" and returns `false` without
    /// touching the network.
    pub async fn check(&self, base_url: &str) -> bool {
        if base_url.is_empty() {
            tracing::debug!("Skipping health probe: no endpoint configured");
            return false;
        }

        let url = format!("{}{}", base_url, self.path);
        let response_future = self
            .client
            .get(&url)
            .header("user-agent", "failover-client-health-check")
            .send();

        // Dropping the timed-out future aborts the underlying connection.
        let healthy = match time::timeout(self.timeout, response_future).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::warn!(
                        url = %url,
                        status = %response.status(),
                        "Health check failed: non-success status"
                    );
                }
                success
            }
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(
                    url = %url,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Health check failed: timeout"
                );
                false
            }
        };

        tracing::debug!(url = %url, healthy, "Health probe finished");
        healthy
    }
}

impl Default for HealthProber {
    fn default() -> Self {
        Self::new(Client::new(), "/health", DEFAULT_HEALTH_TIMEOUT)
    }
}

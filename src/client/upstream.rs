use std::time::Duration;

use reqwest::Client;
use tokio::time::timeout;

use crate::client::error::ClientError;
use crate::client::request::{ApiResponse, RequestOptions};

/// A single bounded network attempt against one URL.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Send `options` to `url`, reading the whole body within `limit`.
    ///
    /// On timeout the in-flight future is dropped, which cancels the
    /// connection rather than leaving it running in the background.
    pub async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
        limit: Duration,
    ) -> Result<ApiResponse, ClientError> {
        match timeout(limit, self.do_send(url, options)).await {
            Ok(response) => response,
            Err(_) => Err(ClientError::Timeout {
                url: url.to_string(),
                timeout_ms: limit.as_millis() as u64,
            }),
        }
    }

    async fn do_send(&self, url: &str, options: &RequestOptions) -> Result<ApiResponse, ClientError> {
        let mut builder = self
            .client
            .request(options.method.clone(), url)
            .headers(options.headers.clone());

        if let Some(token) = &options.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &options.body {
            builder = builder.body(body.clone());
        }

        let upstream_resp = builder.send().await.map_err(|e| {
            if e.is_builder() {
                ClientError::InvalidRequest(e.to_string())
            } else {
                ClientError::Connection {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = upstream_resp.status();
        let headers = upstream_resp.headers().clone();
        let body = upstream_resp
            .bytes()
            .await
            .map_err(|e| ClientError::Body {
                url: url.to_string(),
                source: e,
            })?
            .to_vec();

        Ok(ApiResponse {
            status,
            headers,
            body,
            url: url.to_string(),
        })
    }
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

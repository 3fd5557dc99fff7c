//! Request routing with one-shot failover and background restoration.
//!
//! ```text
//! issue(endpoint)
//!     → attempt against current route
//!     → ok:  return response (spawn primary probe if on backup)
//!     → err: on primary and backup healthy → adopt backup, retry once
//!            otherwise                     → return the error
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::Instrument;
use uuid::Uuid;

use crate::backend::{Route, RoutingState};
use crate::client::error::ClientError;
use crate::client::health::HealthProber;
use crate::client::init::Initializer;
use crate::client::request::{normalize_endpoint, ApiResponse, RequestOptions};
use crate::client::upstream::UpstreamClient;

/// Public request surface. Cheap to clone; clones share routing state.
#[derive(Clone)]
pub struct RequestRouter {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    state: RoutingState,
    prober: HealthProber,
    upstream: UpstreamClient,
    initializer: Initializer,
    ready: OnceCell<Route>,
    restoring: AtomicBool,
}

impl RequestRouter {
    pub fn new(state: RoutingState, prober: HealthProber, upstream: UpstreamClient) -> Self {
        let initializer = Initializer::new(state.clone(), prober.clone());
        Self {
            inner: Arc::new(RouterInner {
                state,
                prober,
                upstream,
                initializer,
                ready: OnceCell::new(),
                restoring: AtomicBool::new(false),
            }),
        }
    }

    pub fn state(&self) -> &RoutingState {
        &self.inner.state
    }

    pub fn prober(&self) -> &HealthProber {
        &self.inner.prober
    }

    /// Reconcile persisted state with live health. Runs once; later calls
    /// and concurrent callers wait for the first run and get its result.
    pub async fn initialize(&self) -> Route {
        *self
            .inner
            .ready
            .get_or_init(|| self.inner.initializer.run())
            .await
    }

    /// Issue a request against whichever endpoint is active.
    ///
    /// HTTP error statuses are returned as responses. Network failures on
    /// the primary trigger at most one failover retry; the retry's error,
    /// if any, is returned unchanged.
    pub async fn issue(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<ApiResponse, ClientError> {
        self.initialize().await;

        let path = normalize_endpoint(endpoint);
        let span = tracing::info_span!(
            "issue",
            request_id = %Uuid::new_v4(),
            method = %options.method,
            path = %path
        );
        self.issue_inner(&path, options).instrument(span).await
    }

    async fn issue_inner(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<ApiResponse, ClientError> {
        let state = &self.inner.state;
        let limit = state.endpoints().timeout();
        let mut retried = false;

        loop {
            let route = state.active();
            let url = format!("{}{}", state.url_for(route), path);
            tracing::debug!(route = %route, url = %url, retried, "Sending request");

            let err = match self.inner.upstream.send(&url, options, limit).await {
                Ok(response) => {
                    if route == Route::Backup {
                        self.schedule_restore();
                    }
                    return Ok(response);
                }
                Err(err) => err,
            };

            if !err.is_transient() {
                return Err(err);
            }

            tracing::warn!(
                route = %route,
                error = %err,
                error_type = err.error_type(),
                "Request failed"
            );

            if retried || route == Route::Backup {
                return Err(err);
            }

            let backup = state.endpoints().backup.as_str();
            if !self.inner.prober.check(backup).await {
                tracing::warn!("Backup unavailable; not failing over");
                return Err(err);
            }

            state.adopt_backup();
            retried = true;
        }
    }

    /// Probe the primary in the background and switch back if it answers.
    ///
    /// Detached from the triggering request; at most one probe runs at a time.
    fn schedule_restore(&self) {
        if self.inner.restoring.swap(true, Ordering::AcqRel) {
            return;
        }

        let router = self.clone();
        tokio::spawn(async move {
            let primary = router.inner.state.endpoints().primary.clone();
            if router.inner.prober.check(&primary).await {
                router.inner.state.adopt_primary();
            }
            router.inner.restoring.store(false, Ordering::Release);
        });
    }
}

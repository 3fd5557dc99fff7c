//! Start-up reconciliation of persisted routing state.
//!
//! A client that failed over and was then shut down resumes on the
//! backup. If the primary recovered in the meantime nothing else would
//! re-probe it until a backup-routed request succeeds, so the initializer
//! checks the primary once before the first request goes out.

use crate::backend::{Route, RoutingState};
use crate::client::health::HealthProber;

#[derive(Clone)]
pub struct Initializer {
    state: RoutingState,
    prober: HealthProber,
}

impl Initializer {
    pub fn new(state: RoutingState, prober: HealthProber) -> Self {
        Self { state, prober }
    }

    /// Reconcile the durable flag against live primary health.
    ///
    /// Returns the route the client starts on.
    pub async fn run(&self) -> Route {
        match self.state.persisted_failover() {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("No persisted failover; starting on primary");
                return self.state.active();
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Failed to read persisted routing state; starting on primary"
                );
                return self.state.active();
            }
        }

        if !self.state.endpoints().has_backup() {
            tracing::info!("Persisted failover but no backup configured; starting on primary");
            self.clear_stale_flag();
            return Route::Primary;
        }

        let primary = self.state.endpoints().primary.clone();
        if self.prober.check(&primary).await {
            tracing::info!(endpoint = %primary, "Primary recovered while inactive; restoring");
            // Clears the stale flag even if state is already primary.
            if !self.state.adopt_primary() {
                self.clear_stale_flag();
            }
            return Route::Primary;
        }

        // Backup health is not re-checked; a failing request will prove otherwise.
        if self.state.restore_persisted() {
            Route::Backup
        } else {
            Route::Primary
        }
    }

    fn clear_stale_flag(&self) {
        if let Err(e) = self.state.clear_persisted() {
            tracing::warn!(error = %e, "Failed to clear persisted routing state");
        }
    }
}

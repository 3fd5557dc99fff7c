//! Routing state: which of the two endpoints the next request targets.
//!
//! Thread-safe and shareable; every transition is check-and-set under one
//! lock, so concurrent callers racing the same failover produce exactly one
//! transition, one persisted write and one notification. Transitions are
//! also serialized with their notification dispatch, so listeners see
//! transitions in the order they were applied.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::backend::store::{StateStore, StoreError};
use crate::config::EndpointSet;

/// Value written under the storage key while failed over.
pub const FAILED_OVER_VALUE: &str = "true";

const TRANSITION_LOG_CAPACITY: usize = 64;

/// Which endpoint is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Primary,
    Backup,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Primary => "primary",
            Route::Backup => "backup",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of routing transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Failover,
    Restore,
}

/// Event delivered to listeners at the moment of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    /// Base URL now being routed to.
    pub endpoint: String,
}

/// Handle returned by [`RoutingState::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Log entry for a routing transition.
#[derive(Debug, Clone)]
pub struct TransitionLogEntry {
    pub timestamp: SystemTime,
    pub from: Route,
    pub to: Route,
}

type Listener = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Shared routing state with a durable mirror and transition listeners.
#[derive(Clone)]
pub struct RoutingState {
    inner: Arc<RoutingStateInner>,
}

struct RoutingStateInner {
    endpoints: EndpointSet,
    store: Arc<dyn StateStore>,
    storage_key: String,
    state: Mutex<StateCell>,
    /// Held from check-and-set until listeners return. Reentrant so a
    /// listener may itself trigger a transition.
    dispatch: ReentrantMutex<()>,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

struct StateCell {
    active: Route,
    log: VecDeque<TransitionLogEntry>,
}

impl RoutingState {
    /// Create routing state on the primary endpoint.
    ///
    /// The durable flag is not read here; reconciling it is the
    /// initializer's job.
    pub fn new(
        endpoints: EndpointSet,
        store: Arc<dyn StateStore>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(RoutingStateInner {
                endpoints,
                store,
                storage_key: storage_key.into(),
                state: Mutex::new(StateCell {
                    active: Route::Primary,
                    log: VecDeque::new(),
                }),
                dispatch: ReentrantMutex::new(()),
                listeners: RwLock::new(Vec::new()),
                next_subscription: AtomicU64::new(0),
            }),
        }
    }

    pub fn endpoints(&self) -> &EndpointSet {
        &self.inner.endpoints
    }

    pub fn active(&self) -> Route {
        self.inner.state.lock().active
    }

    /// Base URL the next request will target.
    pub fn current(&self) -> String {
        self.url_for(self.active()).to_string()
    }

    pub fn url_for(&self, route: Route) -> &str {
        match route {
            Route::Primary => &self.inner.endpoints.primary,
            Route::Backup => &self.inner.endpoints.backup,
        }
    }

    /// Switch to the backup endpoint. No-op if already there or if no
    /// backup is configured.
    ///
    /// Returns `true` if a transition happened.
    pub fn adopt_backup(&self) -> bool {
        if !self.inner.endpoints.has_backup() {
            tracing::debug!("No backup endpoint configured; staying on primary");
            return false;
        }
        self.transition(Route::Backup)
    }

    /// Switch to the primary endpoint. No-op if already there.
    ///
    /// Returns `true` if a transition happened.
    pub fn adopt_primary(&self) -> bool {
        self.transition(Route::Primary)
    }

    /// Align in-memory state with an already-persisted failover without
    /// writing storage or notifying listeners.
    ///
    /// Returns `false` when no backup is configured; the state stays on
    /// primary.
    pub fn restore_persisted(&self) -> bool {
        if !self.inner.endpoints.has_backup() {
            return false;
        }
        let mut state = self.inner.state.lock();
        if state.active != Route::Backup {
            Self::record(&mut state, Route::Backup);
            tracing::info!(
                endpoint = %self.inner.endpoints.backup,
                "Resuming on backup endpoint from persisted state"
            );
        }
        true
    }

    /// Whether the durable mirror says the client is failed over.
    pub fn persisted_failover(&self) -> Result<bool, StoreError> {
        let value = self.inner.store.get(&self.inner.storage_key)?;
        Ok(value.as_deref() == Some(FAILED_OVER_VALUE))
    }

    /// Drop a stale durable flag without touching in-memory state.
    pub fn clear_persisted(&self) -> Result<(), StoreError> {
        let _state = self.inner.state.lock();
        self.inner.store.remove(&self.inner.storage_key)
    }

    /// Register a listener invoked synchronously on every transition.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        let listener: Listener = Arc::new(listener);
        self.inner.listeners.write().push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Recent transitions, oldest first.
    pub fn transitions(&self) -> Vec<TransitionLogEntry> {
        self.inner.state.lock().log.iter().cloned().collect()
    }

    fn transition(&self, to: Route) -> bool {
        let _dispatch = self.inner.dispatch.lock();
        let notification = {
            let mut state = self.inner.state.lock();
            if state.active == to {
                return false;
            }
            let from = Self::record(&mut state, to);
            self.persist(to);

            let endpoint = self.url_for(to).to_string();
            tracing::info!(from = %from, to = %to, endpoint = %endpoint, "Routing switched");

            Notification {
                kind: match to {
                    Route::Backup => NotificationKind::Failover,
                    Route::Primary => NotificationKind::Restore,
                },
                endpoint,
            }
        };

        self.notify(&notification);
        true
    }

    fn record(state: &mut StateCell, to: Route) -> Route {
        let from = state.active;
        state.active = to;
        if state.log.len() == TRANSITION_LOG_CAPACITY {
            state.log.pop_front();
        }
        state.log.push_back(TransitionLogEntry {
            timestamp: SystemTime::now(),
            from,
            to,
        });
        from
    }

    fn persist(&self, route: Route) {
        let key = &self.inner.storage_key;
        let result = match route {
            Route::Backup => self.inner.store.set(key, FAILED_OVER_VALUE),
            Route::Primary => self.inner.store.remove(key),
        };
        if let Err(e) = result {
            // The mirror is a cache; in-memory state stays authoritative.
            tracing::warn!(error = %e, route = %route, "Failed to persist routing state");
        }
    }

    fn notify(&self, notification: &Notification) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(notification))).is_err() {
                tracing::warn!(kind = ?notification.kind, "Routing listener panicked");
            }
        }
    }
}

//! Routing state and its durable mirror.
//!
//! Tracks which of the two configured endpoints is active and persists
//! the failed-over fact so a restart resumes on the same endpoint.

mod state;
mod store;

pub use state::{
    Notification, NotificationKind, Route, RoutingState, SubscriptionId, TransitionLogEntry,
    FAILED_OVER_VALUE,
};
pub use store::{FileStore, MemoryStore, StateStore, StoreError};

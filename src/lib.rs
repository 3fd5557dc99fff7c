//! Resilient request client with primary/backup failover.
//!
//! Requests go to the primary endpoint until a network failure; if the
//! backup answers its health check the client switches to it, retries once,
//! and remembers the switch across restarts. While on backup, every
//! successful request probes the primary in the background and switches
//! back once it recovers.

pub mod backend;
pub mod client;
pub mod config;

pub use backend::{Notification, NotificationKind, Route, RoutingState};
pub use client::error::ClientError;
pub use client::request::{ApiResponse, RequestOptions};
pub use client::router::RequestRouter;
pub use config::{Config, ConfigError, EndpointSet, Profile};

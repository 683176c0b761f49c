//! Realtime sync for the lifeguard dashboards.
//!
//! A dashboard mounts on one scope (a center, or the whole system) and
//! gets back a [`SyncHandle`]: a watchable [`DashboardState`], a
//! [`MutationGateway`] for writes, and the disposer that unmounts it.
//!
//! # Modules
//!
//! - [`channel`] -- Realtime channel seam and the in-process backend
//! - [`nats`] -- NATS backend for the realtime channel
//! - [`state`] -- Dashboard state, actions and the reducer/store
//! - [`refresh`] -- Narrow per-domain refresh functions
//! - [`gateway`] -- Confirm-then-refresh mutation gateway
//! - [`coordinator`] -- Mount, event routing, fallback polling, unmount
//! - [`settings`] -- Timers and policies derived from configuration
//! - [`error`] -- Sync and mutation errors

pub mod channel;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod nats;
pub mod refresh;
pub mod settings;
pub mod state;

pub use channel::{LocalChannel, RealtimeChannel};
pub use coordinator::{SyncDeps, SyncHandle, SyncHandlers, mount_realtime_sync};
pub use error::{MutationError, Operation, SyncError};
pub use gateway::MutationGateway;
pub use nats::NatsChannel;
pub use refresh::Domain;
pub use settings::SyncSettings;
pub use state::{ConnectionState, DashboardState, FlagDisplay};

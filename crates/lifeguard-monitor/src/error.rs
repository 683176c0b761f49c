//! Error types for the monitor binary.
//!
//! [`MonitorError`] wraps every failure that can stop the monitor before
//! or while it mounts, so `main` can propagate with `?`.

/// Top-level error for the monitor binary.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: lifeguard_core::ConfigError,
    },

    /// The REST client could not be built.
    #[error("data access error: {source}")]
    DataAccess {
        /// The underlying client error.
        #[from]
        source: lifeguard_client::DataAccessError,
    },

    /// Joining the realtime channel failed.
    #[error("sync error: {source}")]
    Sync {
        /// The underlying sync error.
        #[from]
        source: lifeguard_sync::SyncError,
    },

    /// A startup option was malformed.
    #[error("invalid option {name}: {reason}")]
    Option {
        /// Environment variable name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {0}")]
    Signal(#[from] std::io::Error),
}

//! Headless lifeguard dashboard.
//!
//! The monitor mounts realtime sync for one scope exactly the way a
//! dashboard view would, then logs every change to the derived state
//! (connectivity, open alerts, current flag, weather, shifts on duty)
//! until it receives Ctrl-C, at which point it unmounts cleanly.
//!
//! # Architecture
//!
//! ```text
//! NATS (push events) --> Coordinator --> narrow refresh --> REST API
//!                                 \--> DashboardStore --> log lines
//! ```

mod error;
mod options;

use std::path::Path;
use std::sync::Arc;

use lifeguard_client::{DataAccess, HttpBackend};
use lifeguard_core::clock::SystemClock;
use lifeguard_core::config::{LifeguardConfig, LogFormat, LoggingConfig};
use lifeguard_sync::{
    DashboardState, FlagDisplay, NatsChannel, RealtimeChannel, SyncDeps, SyncHandle,
    SyncSettings, mount_realtime_sync,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::MonitorError;
use crate::options::Options;

/// Application entry point.
///
/// Reads the startup options, loads configuration, initializes logging,
/// connects to the REST API and NATS, mounts the dashboard and mirrors
/// its state into the log until shutdown.
///
/// # Errors
///
/// Returns an error if configuration, the client or the channel cannot be
/// set up, or if the shutdown signal cannot be installed.
#[tokio::main]
async fn main() -> Result<(), MonitorError> {
    let options = Options::from_env()?;
    let (config, loaded_from_file) = load_config(&options.config_path)?;
    init_tracing(&config.logging);

    info!("lifeguard-monitor starting");
    if !loaded_from_file {
        warn!(
            path = %options.config_path.display(),
            "config file not found, using defaults"
        );
    }
    info!(
        api_url = config.api.base_url,
        nats_url = config.realtime.nats_url,
        scope = %options.scope,
        role = options.role.as_str(),
        poll_interval_secs = config.realtime.poll_interval_secs,
        "configuration loaded"
    );

    let mut settings = SyncSettings::from_config(&config)?;
    if let Some(id) = options.lifeguard {
        settings = settings.for_lifeguard(id);
    }

    let access = DataAccess::from(HttpBackend::new(&config.api)?);
    let channel = RealtimeChannel::from(NatsChannel::connect(&config.realtime).await?);
    info!(backend = access.name(), channel = channel.name(), "collaborators ready");

    let handle = mount_realtime_sync(
        options.scope,
        options.role.handlers(),
        SyncDeps {
            access: Arc::new(access),
            channel: Arc::new(channel),
            clock: Arc::new(SystemClock),
            settings,
        },
    )
    .await?;

    let outcome = watch_until_shutdown(&handle).await;
    handle.unmount().await;
    info!("lifeguard-monitor stopped");
    outcome
}

/// Load the config file, or defaults plus environment overrides when the
/// file does not exist. The flag reports which one happened.
fn load_config(path: &Path) -> Result<(LifeguardConfig, bool), MonitorError> {
    if path.exists() {
        return Ok((LifeguardConfig::from_file(path)?, true));
    }
    let mut config = LifeguardConfig::default();
    config.api.apply_env_overrides();
    config.realtime.apply_env_overrides();
    config.validate()?;
    Ok((config, false))
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

async fn watch_until_shutdown(handle: &SyncHandle) -> Result<(), MonitorError> {
    let mut state = handle.subscribe();
    log_state(&state.borrow_and_update());

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("shutdown requested");
                return Ok(());
            }
            changed = state.changed() => {
                if changed.is_err() {
                    warn!("dashboard store closed");
                    return Ok(());
                }
                log_state(&state.borrow_and_update());
            }
        }
    }
}

fn log_state(state: &DashboardState) {
    let flag = match &state.current_flag {
        None => "loading".to_owned(),
        Some(FlagDisplay::NotSet) => "not set".to_owned(),
        Some(FlagDisplay::Set(flag)) => format!("{:?} ({})", flag.status, flag.reason),
    };
    info!(
        connection = ?state.connection,
        open_alerts = ?state.open_alerts,
        shifts = ?state.shifts.as_ref().map(Vec::len),
        on_duty = ?state.active_shift_count(),
        active_lifeguards = ?state.active_lifeguards,
        active_zones = ?state.active_zones,
        weather = ?state.weather.as_ref().map(|w| w.conditions.as_str()),
        flag,
        "dashboard state"
    );
    if let Some(alert) = &state.alert_notice {
        warn!(
            alert_id = %alert.id,
            alert_type = alert.alert_type,
            severity = ?alert.severity,
            "new alert"
        );
    }
}

//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `lifeguard-config.yaml`. Every
//! section is optional and falls back to the operational defaults
//! (check-in opens 1 hour early and closes 2 hours late, alert counts are
//! re-polled every 30 seconds, new-alert notices show for 5 seconds).

use std::path::Path;
use std::time::Duration;

use chrono::{FixedOffset, TimeDelta};
use serde::Deserialize;

use crate::shift::CheckInPolicy;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LifeguardConfig {
    /// Data access collaborator endpoint.
    #[serde(default)]
    pub api: ApiConfig,

    /// Realtime channel and fallback polling.
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Check-in grace windows.
    #[serde(default)]
    pub check_in: CheckInConfig,

    /// Safety flag history paging.
    #[serde(default)]
    pub flags: FlagConfig,

    /// Weekly schedule generator limits.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LifeguardConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for endpoints:
    /// - `LIFEGUARD_API_URL` overrides `api.base_url`
    /// - `LIFEGUARD_API_TOKEN` overrides `api.token`
    /// - `NATS_URL` overrides `realtime.nats_url`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.api.apply_env_overrides();
        config.realtime.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the runtime misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.realtime.poll_interval_secs == 0 {
            return Err(invalid("realtime.poll_interval_secs must be at least 1"));
        }
        if self.flags.history_page_size == 0 {
            return Err(invalid("flags.history_page_size must be at least 1"));
        }
        if self.schedule.max_weeks == 0 {
            return Err(invalid("schedule.max_weeks must be at least 1"));
        }
        self.check_in.policy().map(|_| ())
    }
}

/// Data access collaborator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, without a trailing slash.
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Bearer token forwarded on every request.
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_api_timeout_ms")]
    pub timeout_ms: u64,
}

impl ApiConfig {
    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LIFEGUARD_API_URL") {
            self.base_url = val;
        }
        if let Ok(val) = std::env::var("LIFEGUARD_API_TOKEN") {
            self.token = Some(val);
        }
    }

    /// Request timeout as a [`Duration`].
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            token: None,
            timeout_ms: default_api_timeout_ms(),
        }
    }
}

/// Realtime channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RealtimeConfig {
    /// NATS server URL.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// First token of every event subject.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// Fallback alert-count poll cadence in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// How long the new-alert notice stays up, in seconds.
    #[serde(default = "default_notice_duration_secs")]
    pub notice_duration_secs: u64,
}

impl RealtimeConfig {
    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NATS_URL") {
            self.nats_url = val;
        }
    }

    /// Fallback poll cadence.
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// New-alert notice display duration.
    pub const fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.notice_duration_secs)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            nats_url: default_nats_url(),
            subject_prefix: default_subject_prefix(),
            poll_interval_secs: default_poll_interval_secs(),
            notice_duration_secs: default_notice_duration_secs(),
        }
    }
}

/// Check-in grace window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckInConfig {
    /// How many minutes before the scheduled start check-in opens.
    #[serde(default = "default_early_grace_minutes")]
    pub early_grace_minutes: u32,

    /// How many minutes after the scheduled start check-in stays open.
    #[serde(default = "default_late_grace_minutes")]
    pub late_grace_minutes: u32,

    /// Site offset from UTC in minutes; decides what "same calendar day"
    /// means and how schedule templates map to instants.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl CheckInConfig {
    /// Build the policy the shift state machine enforces.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the offset is outside +/-24h.
    pub fn policy(&self) -> Result<CheckInPolicy, ConfigError> {
        Ok(CheckInPolicy {
            early_grace: TimeDelta::minutes(i64::from(self.early_grace_minutes)),
            late_grace: TimeDelta::minutes(i64::from(self.late_grace_minutes)),
            site_offset: self.site_offset()?,
        })
    }

    /// The site's fixed UTC offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the offset is outside +/-24h.
    pub fn site_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                invalid(&format!(
                    "check_in.utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ))
            })
    }
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            early_grace_minutes: default_early_grace_minutes(),
            late_grace_minutes: default_late_grace_minutes(),
            utc_offset_minutes: 0,
        }
    }
}

/// Safety flag configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FlagConfig {
    /// Page size used when fetching history to resolve the current flag.
    #[serde(default = "default_history_page_size")]
    pub history_page_size: u32,
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self {
            history_page_size: default_history_page_size(),
        }
    }
}

/// Weekly schedule generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScheduleConfig {
    /// Largest accepted `weeks` value in a template.
    #[serde(default = "default_max_weeks")]
    pub max_weeks: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            max_weeks: default_max_weeks(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_api_url() -> String {
    "http://localhost:5000/api".to_owned()
}

const fn default_api_timeout_ms() -> u64 {
    10_000
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_owned()
}

fn default_subject_prefix() -> String {
    "lifeguard".to_owned()
}

const fn default_poll_interval_secs() -> u64 {
    30
}

const fn default_notice_duration_secs() -> u64 {
    5
}

const fn default_early_grace_minutes() -> u32 {
    60
}

const fn default_late_grace_minutes() -> u32 {
    120
}

const fn default_history_page_size() -> u32 {
    10
}

const fn default_max_weeks() -> u32 {
    52
}

fn default_log_level() -> String {
    "info".to_owned()
}

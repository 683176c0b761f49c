//! Runtime settings for one mounted dashboard.

use std::time::Duration;

use lifeguard_core::config::LifeguardConfig;
use lifeguard_core::shift::CheckInPolicy;
use lifeguard_types::LifeguardId;

use crate::error::SyncError;

/// Timers, page sizes and policies a mounted dashboard runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Fallback alert-count poll cadence.
    pub poll_interval: Duration,
    /// How long the new-alert notice stays up.
    pub notice_duration: Duration,
    /// History page size used to resolve the current flag.
    pub flag_page_size: u32,
    /// Check-in windows and site offset.
    pub check_in: CheckInPolicy,
    /// Largest accepted schedule template length in weeks.
    pub max_weeks: u32,
    /// When set, the shifts domain lists only this lifeguard's shifts.
    pub lifeguard: Option<LifeguardId>,
}

impl SyncSettings {
    /// Derive settings from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if the check-in section is invalid.
    pub fn from_config(config: &LifeguardConfig) -> Result<Self, SyncError> {
        Ok(Self {
            poll_interval: config.realtime.poll_interval(),
            notice_duration: config.realtime.notice_duration(),
            flag_page_size: config.flags.history_page_size,
            check_in: config.check_in.policy()?,
            max_weeks: config.schedule.max_weeks,
            lifeguard: None,
        })
    }

    /// Restrict the shifts domain to one lifeguard's roster.
    #[must_use]
    pub const fn for_lifeguard(mut self, id: LifeguardId) -> Self {
        self.lifeguard = Some(id);
        self
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            notice_duration: Duration::from_secs(5),
            flag_page_size: 10,
            check_in: CheckInPolicy::default(),
            max_weeks: 52,
            lifeguard: None,
        }
    }
}

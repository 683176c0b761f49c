//! Shift lifecycle, weekly scheduling and safety-flag resolution.
//!
//! Everything in this crate is synchronous and works on plain data, so
//! dashboards and the realtime coordinator can call it on every refresh
//! without touching the network.
//!
//! # Modules
//!
//! - [`clock`] -- [`Clock`] seam with system and manual implementations.
//! - [`config`] -- Configuration loading from `lifeguard-config.yaml`.
//! - [`error`] -- Lifecycle error taxonomy.
//! - [`flag`] -- Current-flag resolution over a flag history page.
//! - [`schedule`] -- Weekly template expansion and conflict planning.
//! - [`shift`] -- Shift state machine and check-in eligibility window.
//!
//! [`Clock`]: clock::Clock

pub mod clock;
pub mod config;
pub mod error;
pub mod flag;
pub mod schedule;
pub mod shift;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, LifeguardConfig};
pub use error::LifecycleError;
pub use flag::resolve_current_flag;
pub use schedule::{plan_weekly_schedule, SchedulePlan, ScheduleError, ScheduleReport};
pub use shift::{
    evaluate_check_in_eligibility, CheckInDenial, CheckInEligibility, CheckInPolicy,
};

//! Shift state machine and check-in eligibility.
//!
//! ```text
//! scheduled --check-in--> active --check-out--> completed
//!     \                     /
//!      +----cancel---------+------> cancelled
//! ```
//!
//! Check-in is gated by a window around the scheduled start: it opens
//! [`CheckInPolicy::early_grace`] before the start, closes
//! [`CheckInPolicy::late_grace`] after it (or at the scheduled end, if
//! that comes first), and only on the start's calendar day in the site's
//! local time. Check-out has no time window.
//!
//! Every function here works on plain data. Callers that talk to the
//! collaborator run these checks first and only apply the collaborator's
//! returned record; see the mutation gateway in `lifeguard-sync`.

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use lifeguard_types::{GeoPoint, Shift, ShiftPatch, ShiftStatus};
use serde::Serialize;

use crate::error::LifecycleError;

/// Grace windows around the scheduled start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInPolicy {
    /// How long before the scheduled start check-in opens.
    pub early_grace: TimeDelta,
    /// How long after the scheduled start check-in stays open.
    pub late_grace: TimeDelta,
    /// The site's UTC offset, used for the same-day rule.
    pub site_offset: FixedOffset,
}

impl Default for CheckInPolicy {
    fn default() -> Self {
        Self {
            early_grace: TimeDelta::hours(1),
            late_grace: TimeDelta::hours(2),
            site_offset: Utc.fix(),
        }
    }
}

/// Why a check-in request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum CheckInDenial {
    /// The shift is not in the `scheduled` state.
    WrongStatus {
        /// The shift's actual status.
        status: ShiftStatus,
    },
    /// A check-in is already recorded.
    AlreadyCheckedIn,
    /// The shift does not start today.
    WrongDay,
    /// More than the early grace before the scheduled start.
    TooEarly,
    /// The scheduled end has passed.
    ShiftEnded,
    /// More than the late grace after the scheduled start.
    TooLate,
}

impl CheckInDenial {
    /// Stable machine-readable code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::WrongStatus { .. } => "wrong_status",
            Self::AlreadyCheckedIn => "already_checked_in",
            Self::WrongDay => "wrong_day",
            Self::TooEarly => "too_early",
            Self::ShiftEnded => "shift_ended",
            Self::TooLate => "too_late",
        }
    }
}

impl core::fmt::Display for CheckInDenial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WrongStatus { status } => {
                write!(f, "shift is {status}; only scheduled shifts can be checked in")
            }
            Self::AlreadyCheckedIn => f.write_str("already checked in for this shift"),
            Self::WrongDay => f.write_str("check-in is only possible on the day of the shift"),
            Self::TooEarly => f.write_str("too early: check-in is not open yet"),
            Self::ShiftEnded => f.write_str("the shift has already ended"),
            Self::TooLate => f.write_str("too late: the check-in window has closed"),
        }
    }
}

/// Eligibility report shown next to the check-in button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInEligibility {
    /// Whether a check-in request would be accepted now.
    pub allowed: bool,
    /// Why not, when `allowed` is false.
    pub reason: Option<CheckInDenial>,
    /// Human-readable form of `reason`.
    pub message: Option<String>,
}

impl CheckInEligibility {
    const fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            message: None,
        }
    }

    fn denied(reason: CheckInDenial) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            message: Some(reason.to_string()),
        }
    }
}

/// Earliest and latest instants at which check-in is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckInWindow {
    /// Check-in opens.
    pub opens_at: DateTime<Utc>,
    /// Check-in closes (inclusive).
    pub closes_at: DateTime<Utc>,
}

/// The check-in window for a shift, ignoring its status.
///
/// Both ends are clamped to the start's calendar day at the site offset,
/// so every instant inside the window passes the same-day rule.
///
/// Returns `None` when the window arithmetic overflows.
pub fn check_in_window(shift: &Shift, policy: &CheckInPolicy) -> Option<CheckInWindow> {
    let (day_start, day_end) = site_day_bounds(shift.start_time, policy.site_offset)?;
    let early_open = shift.start_time.checked_sub_signed(policy.early_grace)?;
    let late_close = shift.start_time.checked_add_signed(policy.late_grace)?;
    Some(CheckInWindow {
        opens_at: early_open.max(day_start),
        closes_at: late_close.min(shift.end_time).min(day_end),
    })
}

/// First and last instant of the local calendar day containing `at`.
fn site_day_bounds(
    at: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let day = at.with_timezone(&offset).date_naive();
    let start = offset
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .single()?
        .with_timezone(&Utc);
    let end = start
        .checked_add_signed(TimeDelta::days(1))?
        .checked_sub_signed(TimeDelta::nanoseconds(1))?;
    Some((start, end))
}

/// Decide whether `shift` may be checked in at `now`.
///
/// Rules are checked in order and the first failure is reported.
pub fn evaluate_check_in_eligibility(
    shift: &Shift,
    now: DateTime<Utc>,
    policy: &CheckInPolicy,
) -> CheckInEligibility {
    match check_in_denial(shift, now, policy) {
        Some(reason) => CheckInEligibility::denied(reason),
        None => CheckInEligibility::allowed(),
    }
}

fn check_in_denial(
    shift: &Shift,
    now: DateTime<Utc>,
    policy: &CheckInPolicy,
) -> Option<CheckInDenial> {
    if shift.status != ShiftStatus::Scheduled {
        return Some(CheckInDenial::WrongStatus {
            status: shift.status,
        });
    }
    if shift.has_checked_in() {
        return Some(CheckInDenial::AlreadyCheckedIn);
    }
    let start_day = shift.start_time.with_timezone(&policy.site_offset).date_naive();
    let today = now.with_timezone(&policy.site_offset).date_naive();
    if start_day != today {
        return Some(CheckInDenial::WrongDay);
    }
    if shift.start_time.signed_duration_since(now) > policy.early_grace {
        return Some(CheckInDenial::TooEarly);
    }
    if now > shift.end_time {
        return Some(CheckInDenial::ShiftEnded);
    }
    if now.signed_duration_since(shift.start_time) > policy.late_grace {
        return Some(CheckInDenial::TooLate);
    }
    None
}

/// Whether `from -> to` is in the transition table.
pub const fn transition_allowed(from: ShiftStatus, to: ShiftStatus) -> bool {
    from.can_transition_to(to)
}

fn ensure_transition(from: ShiftStatus, to: ShiftStatus) -> Result<(), LifecycleError> {
    if transition_allowed(from, to) {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition { from, to })
    }
}

/// Check in: `scheduled -> active`, stamping time and location.
///
/// # Errors
///
/// Returns [`LifecycleError::CheckInNotAllowed`] with the first failed
/// eligibility rule. The shift is left untouched on error.
pub fn request_check_in(
    shift: &mut Shift,
    location: GeoPoint,
    now: DateTime<Utc>,
    policy: &CheckInPolicy,
) -> Result<(), LifecycleError> {
    if let Some(reason) = check_in_denial(shift, now, policy) {
        return Err(LifecycleError::CheckInNotAllowed { reason });
    }
    shift.status = ShiftStatus::Active;
    shift.check_in_time = Some(now);
    shift.check_in_location = Some(location);
    shift.updated_at = now;
    Ok(())
}

/// Check out: `active -> completed`, stamping the time.
///
/// # Errors
///
/// Returns [`LifecycleError::InvalidTransition`] unless the shift is active
/// with no check-out recorded.
pub fn request_check_out(shift: &mut Shift, now: DateTime<Utc>) -> Result<(), LifecycleError> {
    ensure_check_out(shift)?;
    shift.status = ShiftStatus::Completed;
    shift.check_out_time = Some(now);
    shift.updated_at = now;
    Ok(())
}

/// The check-out precondition on its own, for callers that delegate the
/// actual transition to the collaborator.
///
/// # Errors
///
/// Same as [`request_check_out`].
pub fn ensure_check_out(shift: &Shift) -> Result<(), LifecycleError> {
    if shift.status != ShiftStatus::Active || shift.has_checked_out() {
        return Err(LifecycleError::InvalidTransition {
            from: shift.status,
            to: ShiftStatus::Completed,
        });
    }
    Ok(())
}

/// Cancel from `scheduled` or `active`.
///
/// # Errors
///
/// Returns [`LifecycleError::InvalidTransition`] from a terminal status.
pub fn cancel(shift: &mut Shift, now: DateTime<Utc>) -> Result<(), LifecycleError> {
    ensure_transition(shift.status, ShiftStatus::Cancelled)?;
    shift.status = ShiftStatus::Cancelled;
    shift.updated_at = now;
    Ok(())
}

/// Active and past its scheduled end. Display only; never transitions.
pub fn is_overdue(shift: &Shift, now: DateTime<Utc>) -> bool {
    shift.status == ShiftStatus::Active && now > shift.end_time
}

/// Reject intervals whose end is not strictly after the start.
///
/// # Errors
///
/// Returns [`LifecycleError::Validation`].
pub fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), LifecycleError> {
    if end > start {
        Ok(())
    } else {
        Err(LifecycleError::validation(format!(
            "shift end {end} must be after start {start}"
        )))
    }
}

/// Validate an administrative edit against the current record.
///
/// Times may only move on non-terminal shifts and must keep `end > start`
/// once merged with the unchanged side. A status change must be a legal
/// transition; patching the current status is a no-op.
///
/// # Errors
///
/// Returns [`LifecycleError::Validation`] or
/// [`LifecycleError::InvalidTransition`].
pub fn validate_patch(shift: &Shift, patch: &ShiftPatch) -> Result<(), LifecycleError> {
    if patch.start_time.is_some() || patch.end_time.is_some() {
        if shift.status.is_terminal() {
            return Err(LifecycleError::validation(format!(
                "cannot reschedule a {} shift",
                shift.status
            )));
        }
        validate_interval(
            patch.start_time.unwrap_or(shift.start_time),
            patch.end_time.unwrap_or(shift.end_time),
        )?;
    }
    match patch.status {
        Some(to) if to != shift.status => ensure_transition(shift.status, to),
        _ => Ok(()),
    }
}

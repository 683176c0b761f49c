//! Current safety flag resolution.
//!
//! A center's "current" flag is derived from its history on every read:
//! the first entry, in the order the collaborator returned it (most
//! recent `set_at` first), that has no expiration or expires strictly
//! after `now`. A newer flag therefore supersedes older ones without the
//! older ones being deleted, and an expired newest flag lets the next
//! unexpired one show through.

use chrono::{DateTime, Utc};
use lifeguard_types::{FlagDraft, SafetyFlag};

use crate::error::LifecycleError;

/// Whether `flag` is still in force at `now`.
///
/// A flag whose `expires_at` equals `now` has expired.
pub fn is_in_force(flag: &SafetyFlag, now: DateTime<Utc>) -> bool {
    flag.expires_at.is_none_or(|expires_at| now < expires_at)
}

/// Pick the current flag out of a most-recent-first history page.
///
/// The input order is authoritative and is not re-sorted. Returns `None`
/// when no entry is in force, which dashboards show as "no flag set".
pub fn resolve_current_flag(history: &[SafetyFlag], now: DateTime<Utc>) -> Option<&SafetyFlag> {
    history.iter().find(|flag| is_in_force(flag, now))
}

/// Validate a flag draft before it is sent to the collaborator.
///
/// # Errors
///
/// Returns [`LifecycleError::Validation`] for a blank reason or an
/// expiration that is not in the future.
pub fn validate_draft(draft: &FlagDraft, now: DateTime<Utc>) -> Result<(), LifecycleError> {
    if draft.reason.trim().is_empty() {
        return Err(LifecycleError::validation("a reason is required"));
    }
    match draft.expires_at {
        Some(expires_at) if expires_at <= now => Err(LifecycleError::validation(format!(
            "expiration {expires_at} must be in the future"
        ))),
        _ => Ok(()),
    }
}

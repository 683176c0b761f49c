//! Errors raised by the shift lifecycle and flag rules.
//!
//! These are resolved locally and surfaced to the caller as a reason
//! string; nothing here involves the data access collaborator.

use lifeguard_types::ShiftStatus;

use crate::shift::CheckInDenial;

/// A shift or flag operation was rejected before reaching the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// Malformed input (end not after start, empty reason, ...).
    #[error("validation failed: {reason}")]
    Validation {
        /// What is wrong with the input.
        reason: String,
    },

    /// Check-in refused by the eligibility window or shift state.
    #[error("check-in not allowed: {reason}")]
    CheckInNotAllowed {
        /// Why the check-in was refused.
        reason: CheckInDenial,
    },

    /// The requested status change is not in the transition table.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: ShiftStatus,
        /// Requested status.
        to: ShiftStatus,
    },
}

impl LifecycleError {
    /// Build a [`LifecycleError::Validation`].
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

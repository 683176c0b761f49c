//! Error types for the realtime sync layer.
//!
//! [`SyncError`] covers the channel and mount path. [`MutationError`] is
//! what a dashboard action gets back from the mutation gateway: it names
//! the operation and carries a message fit for display.

use lifeguard_client::DataAccessError;
use lifeguard_core::LifecycleError;
use lifeguard_core::schedule::ScheduleError;

/// Errors that can occur while mounting or running realtime sync.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Failed to connect to or communicate with the realtime channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Settings derived from configuration are invalid.
    #[error("config error: {0}")]
    Config(#[from] lifeguard_core::ConfigError),
}

/// A user-initiated operation routed through the mutation gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create one shift.
    CreateShift,
    /// Administrative shift edit.
    UpdateShift,
    /// Delete a shift.
    DeleteShift,
    /// Lifeguard check-in.
    CheckIn,
    /// Lifeguard check-out.
    CheckOut,
    /// Administrative cancellation.
    CancelShift,
    /// Weekly schedule generation.
    GenerateSchedule,
    /// Set a new safety flag.
    CreateFlag,
    /// Edit a safety flag.
    UpdateFlag,
    /// Delete a safety flag.
    DeleteFlag,
    /// Move an alert to a new handling status.
    UpdateAlertStatus,
}

impl Operation {
    /// Message shown when the collaborator gave no reason of its own.
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::CreateShift => "Failed to create shift. Please try again.",
            Self::UpdateShift => "Failed to update shift. Please try again.",
            Self::DeleteShift => "Failed to delete shift. Please try again.",
            Self::CheckIn => "Failed to check in. Please try again.",
            Self::CheckOut => "Failed to check out. Please try again.",
            Self::CancelShift => "Failed to cancel shift. Please try again.",
            Self::GenerateSchedule => "Failed to generate schedule. Please try again.",
            Self::CreateFlag => "Failed to set safety flag. Please try again.",
            Self::UpdateFlag => "Failed to update safety flag. Please try again.",
            Self::DeleteFlag => "Failed to delete safety flag. Please try again.",
            Self::UpdateAlertStatus => "Failed to update alert. Please try again.",
        }
    }

    /// Short name used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateShift => "create_shift",
            Self::UpdateShift => "update_shift",
            Self::DeleteShift => "delete_shift",
            Self::CheckIn => "check_in",
            Self::CheckOut => "check_out",
            Self::CancelShift => "cancel_shift",
            Self::GenerateSchedule => "generate_schedule",
            Self::CreateFlag => "create_flag",
            Self::UpdateFlag => "update_flag",
            Self::DeleteFlag => "delete_flag",
            Self::UpdateAlertStatus => "update_alert_status",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a mutation did not happen.
#[derive(Debug, thiserror::Error)]
pub enum MutationErrorKind {
    /// Refused locally before the collaborator was called.
    #[error(transparent)]
    Rejected(#[from] LifecycleError),

    /// The schedule template is malformed.
    #[error(transparent)]
    Template(#[from] ScheduleError),

    /// The collaborator call failed.
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

/// A gateway operation failed; no local state was changed.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed: {kind}")]
pub struct MutationError {
    /// The operation that failed.
    pub operation: Operation,
    /// What went wrong.
    #[source]
    pub kind: MutationErrorKind,
}

impl MutationError {
    /// Wrap a failure for `operation`.
    pub fn new(operation: Operation, kind: impl Into<MutationErrorKind>) -> Self {
        Self {
            operation,
            kind: kind.into(),
        }
    }

    /// Text to show the user.
    ///
    /// Local rejections carry their own reason. Collaborator failures use
    /// the server-provided message when there is one and the operation's
    /// fallback otherwise.
    pub fn user_message(&self) -> String {
        match &self.kind {
            MutationErrorKind::Rejected(LifecycleError::Validation { reason }) => reason.clone(),
            MutationErrorKind::Rejected(LifecycleError::CheckInNotAllowed { reason }) => {
                reason.to_string()
            }
            MutationErrorKind::Rejected(err @ LifecycleError::InvalidTransition { .. }) => {
                err.to_string()
            }
            MutationErrorKind::Template(ScheduleError::InvalidTemplate { reason }) => {
                reason.clone()
            }
            MutationErrorKind::DataAccess(err) => err
                .server_message()
                .unwrap_or_else(|| self.operation.fallback_message())
                .to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use lifeguard_core::CheckInDenial;
    use lifeguard_types::ShiftStatus;

    use super::*;

    #[test]
    fn server_message_wins_over_fallback() {
        let err = MutationError::new(
            Operation::CreateFlag,
            DataAccessError::rejected(400, "Reason is required"),
        );
        assert_eq!(err.user_message(), "Reason is required");
    }

    #[test]
    fn transport_failure_uses_operation_fallback() {
        let err = MutationError::new(
            Operation::CheckIn,
            DataAccessError::Transport("connection reset".into()),
        );
        assert_eq!(err.user_message(), "Failed to check in. Please try again.");
        assert_eq!(
            err.to_string(),
            "check_in failed: transport error: connection reset"
        );
    }

    #[test]
    fn local_rejections_surface_their_reason() {
        let err = MutationError::new(
            Operation::CheckIn,
            LifecycleError::CheckInNotAllowed {
                reason: CheckInDenial::TooLate,
            },
        );
        assert!(err.user_message().starts_with("too late"));

        let err = MutationError::new(
            Operation::CancelShift,
            LifecycleError::InvalidTransition {
                from: ShiftStatus::Completed,
                to: ShiftStatus::Cancelled,
            },
        );
        assert_eq!(
            err.user_message(),
            "invalid transition from completed to cancelled"
        );
    }
}

//! Enumeration types shared by the collaborator API, the core logic and
//! the dashboards.
//!
//! Wire names are lowercase to match the REST payloads.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Shifts
// ---------------------------------------------------------------------------

/// Lifecycle status of a duty shift.
///
/// Progress is `Scheduled -> Active -> Completed`; `Cancelled` is the
/// administrative escape from either non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ShiftStatus {
    /// Created, not yet checked in.
    Scheduled,
    /// Lifeguard has checked in and is on duty.
    Active,
    /// Lifeguard has checked out.
    Completed,
    /// Cancelled by an administrator.
    Cancelled,
}

impl ShiftStatus {
    /// Whether no further transition is possible from this status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `self -> to` is a legal lifecycle transition.
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Scheduled, Self::Active | Self::Cancelled)
                | (Self::Active, Self::Completed | Self::Cancelled)
        )
    }

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Safety flags
// ---------------------------------------------------------------------------

/// Beach safety flag colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum FlagStatus {
    /// Calm conditions.
    Green,
    /// Moderate surf or currents.
    Yellow,
    /// Dangerous surf or currents.
    Red,
    /// Water closed to the public.
    Black,
}

impl FlagStatus {
    /// Hazard description shown next to the flag colour.
    pub const fn hazard_label(self) -> &'static str {
        match self {
            Self::Green => "Low hazard",
            Self::Yellow => "Medium hazard",
            Self::Red => "High hazard",
            Self::Black => "Water closed",
        }
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Handling status of an emergency alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum AlertStatus {
    /// Raised and not yet handled.
    Active,
    /// A responder has taken the alert.
    Responding,
    /// Closed.
    Resolved,
}

impl AlertStatus {
    /// Whether the alert still counts towards a dashboard's open-alert total.
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Resolved)
    }
}

/// Severity attached to an alert when it is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum AlertSeverity {
    /// Informational.
    Low,
    /// Needs attention.
    Medium,
    /// Needs immediate attention.
    High,
    /// Life-threatening.
    Critical,
}

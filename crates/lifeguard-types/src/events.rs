//! Push events delivered by the realtime channel and the scopes they are
//! published under.
//!
//! Every event names the scope it belongs to. Dashboards subscribe to one
//! scope and discard events for any other.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::AlertStatus;
use crate::ids::{AlertId, CenterId, FlagId, ZoneId};
use crate::structs::{Alert, WeatherSnapshot};

/// Subscription boundary for realtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Scope {
    /// A single center.
    Center {
        /// The center.
        center_id: CenterId,
    },
    /// Every center plus events not tied to any center.
    System,
}

impl Scope {
    /// Scope for a single center.
    pub const fn center(center_id: CenterId) -> Self {
        Self::Center { center_id }
    }

    /// The center this scope is bound to, if any.
    pub const fn center_id(&self) -> Option<CenterId> {
        match self {
            Self::Center { center_id } => Some(*center_id),
            Self::System => None,
        }
    }

    /// Whether an event published under `event_scope` belongs to a view
    /// subscribed to `self`.
    ///
    /// A system subscription sees everything. A center subscription sees
    /// its own center's events only.
    pub fn admits(&self, event_scope: &Self) -> bool {
        match self {
            Self::System => true,
            Self::Center { .. } => self == event_scope,
        }
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Center { center_id } => write!(f, "center:{center_id}"),
            Self::System => f.write_str("system"),
        }
    }
}

/// Name of a push event, used as the handler registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// A new alert was raised.
    AlertRaised,
    /// An alert changed handling status.
    AlertStatusChanged,
    /// A new weather observation is available.
    WeatherUpdated,
    /// A safety flag was created, edited or deleted.
    FlagUpdated,
    /// A zone was created, edited or toggled.
    ZoneUpdated,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::AlertRaised,
        Self::AlertStatusChanged,
        Self::WeatherUpdated,
        Self::FlagUpdated,
        Self::ZoneUpdated,
    ];

    /// Wire name, also used as the last token of the channel subject.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlertRaised => "alert_raised",
            Self::AlertStatusChanged => "alert_status_changed",
            Self::WeatherUpdated => "weather_updated",
            Self::FlagUpdated => "flag_updated",
            Self::ZoneUpdated => "zone_updated",
        }
    }
}

/// A server-pushed domain event.
///
/// Payloads are hints: handlers re-fetch the implicated domain instead of
/// applying payload contents to dashboard state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PushEvent {
    /// A new alert was raised.
    AlertRaised {
        /// The alert as raised.
        alert: Alert,
    },
    /// An alert changed handling status.
    AlertStatusChanged {
        /// Center of the alert; `None` for system-wide alerts.
        center_id: Option<CenterId>,
        /// The alert.
        alert_id: AlertId,
        /// New status.
        status: AlertStatus,
    },
    /// A new weather observation is available.
    WeatherUpdated {
        /// The observation.
        weather: WeatherSnapshot,
    },
    /// A safety flag was created, edited or deleted.
    FlagUpdated {
        /// Center whose flag history changed.
        center_id: CenterId,
        /// The flag touched, if known.
        flag_id: Option<FlagId>,
    },
    /// A zone was created, edited or toggled.
    ZoneUpdated {
        /// Owning center.
        center_id: CenterId,
        /// The zone touched.
        zone_id: ZoneId,
    },
}

impl PushEvent {
    /// The event's name.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::AlertRaised { .. } => EventKind::AlertRaised,
            Self::AlertStatusChanged { .. } => EventKind::AlertStatusChanged,
            Self::WeatherUpdated { .. } => EventKind::WeatherUpdated,
            Self::FlagUpdated { .. } => EventKind::FlagUpdated,
            Self::ZoneUpdated { .. } => EventKind::ZoneUpdated,
        }
    }

    /// The scope the event is published under.
    pub const fn scope(&self) -> Scope {
        let center = match self {
            Self::AlertRaised { alert } => alert.center_id,
            Self::AlertStatusChanged { center_id, .. } => *center_id,
            Self::WeatherUpdated { weather } => Some(weather.center_id),
            Self::FlagUpdated { center_id, .. } | Self::ZoneUpdated { center_id, .. } => {
                Some(*center_id)
            }
        };
        match center {
            Some(center_id) => Scope::Center { center_id },
            None => Scope::System,
        }
    }
}

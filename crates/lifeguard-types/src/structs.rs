//! Record types returned by and sent to the data access collaborator.
//!
//! Records are denormalized the way the REST API returns them: a shift
//! carries the lifeguard and center display names alongside the ids.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AlertSeverity, AlertStatus, FlagStatus, ShiftStatus};
use crate::ids::{AlertId, CenterId, FlagId, LifeguardId, ShiftId, ZoneId};

// ---------------------------------------------------------------------------
// Shifts
// ---------------------------------------------------------------------------

/// GPS position reported by a lifeguard's device at check-in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// One scheduled duty period for one lifeguard at one center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Shift {
    /// Shift identity.
    pub id: ShiftId,
    /// Assigned lifeguard.
    pub lifeguard_id: LifeguardId,
    /// Center where the shift takes place.
    pub center_id: CenterId,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Scheduled end, strictly after `start_time`.
    pub end_time: DateTime<Utc>,
    /// Lifecycle status.
    pub status: ShiftStatus,
    /// When the lifeguard checked in.
    #[serde(default)]
    pub check_in_time: Option<DateTime<Utc>>,
    /// Where the lifeguard checked in.
    #[serde(default)]
    pub check_in_location: Option<GeoPoint>,
    /// When the lifeguard checked out.
    #[serde(default)]
    pub check_out_time: Option<DateTime<Utc>>,
    /// Lifeguard display name (joined by the API).
    #[serde(default)]
    pub lifeguard_name: Option<String>,
    /// Center display name (joined by the API).
    #[serde(default)]
    pub center_name: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    /// Scheduled length of the shift.
    pub fn duration(&self) -> chrono::Duration {
        self.end_time.signed_duration_since(self.start_time)
    }

    /// Whether the half-open interval `[start, end)` intersects this shift's
    /// scheduled `[start_time, end_time)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && start < self.end_time
    }

    /// Whether a check-in has been recorded.
    pub const fn has_checked_in(&self) -> bool {
        self.check_in_time.is_some()
    }

    /// Whether a check-out has been recorded.
    pub const fn has_checked_out(&self) -> bool {
        self.check_out_time.is_some()
    }
}

/// Request body for creating a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewShift {
    /// Assigned lifeguard.
    pub lifeguard_id: LifeguardId,
    /// Center where the shift takes place.
    pub center_id: CenterId,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Scheduled end.
    pub end_time: DateTime<Utc>,
}

/// Partial update for an administrative shift edit.
///
/// Absent fields are left unchanged by the collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ShiftPatch {
    /// Reassign to another lifeguard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifeguard_id: Option<LifeguardId>,
    /// New scheduled start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// New scheduled end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ShiftStatus>,
}

/// Recurrence template expanded by the weekly schedule generator.
///
/// Times of day and the start date are in the site's local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScheduleTemplate {
    /// Lifeguard to schedule.
    pub lifeguard_id: LifeguardId,
    /// Center to schedule at.
    pub center_id: CenterId,
    /// Daily start time of day.
    pub start_time: NaiveTime,
    /// Daily end time of day, after `start_time`.
    pub end_time: NaiveTime,
    /// First calendar date of the expansion.
    pub start_date: NaiveDate,
    /// Selected weekdays.
    pub days: Vec<DayOfWeek>,
    /// Number of weeks to expand.
    pub weeks: u32,
}

/// Weekday selector used by [`ScheduleTemplate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum DayOfWeek {
    /// Monday.
    Monday,
    /// Tuesday.
    Tuesday,
    /// Wednesday.
    Wednesday,
    /// Thursday.
    Thursday,
    /// Friday.
    Friday,
    /// Saturday.
    Saturday,
    /// Sunday.
    Sunday,
}

impl DayOfWeek {
    /// Convert to the equivalent [`chrono::Weekday`].
    pub const fn to_weekday(self) -> chrono::Weekday {
        match self {
            Self::Monday => chrono::Weekday::Mon,
            Self::Tuesday => chrono::Weekday::Tue,
            Self::Wednesday => chrono::Weekday::Wed,
            Self::Thursday => chrono::Weekday::Thu,
            Self::Friday => chrono::Weekday::Fri,
            Self::Saturday => chrono::Weekday::Sat,
            Self::Sunday => chrono::Weekday::Sun,
        }
    }
}

// ---------------------------------------------------------------------------
// Safety flags
// ---------------------------------------------------------------------------

/// A time-stamped safety declaration for a center.
///
/// Whether a flag is the center's current one is derived from the history,
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SafetyFlag {
    /// Flag identity.
    pub id: FlagId,
    /// Center the flag applies to.
    pub center_id: CenterId,
    /// Flag colour.
    pub status: FlagStatus,
    /// Free-text reason.
    pub reason: String,
    /// Name of the admin who set the flag.
    pub set_by_name: String,
    /// Email of the admin who set the flag.
    pub set_by_email: String,
    /// When the flag was set.
    pub set_at: DateTime<Utc>,
    /// Optional expiration; `None` means permanent until superseded.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Body for creating or editing a safety flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FlagDraft {
    /// Flag colour.
    pub status: FlagStatus,
    /// Free-text reason.
    pub reason: String,
    /// Optional expiration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Pagination block returned with paged listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Total number of records.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u32,
}

/// One page of a center's flag history, most recent `set_at` first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FlagHistoryPage {
    /// Flags on this page.
    pub flags: Vec<SafetyFlag>,
    /// Page metadata.
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// Alerts, weather, staff, zones
// ---------------------------------------------------------------------------

/// An emergency alert raised at (or outside of) a center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Alert {
    /// Alert identity.
    pub id: AlertId,
    /// Center the alert belongs to; `None` for system-wide alerts.
    #[serde(default)]
    pub center_id: Option<CenterId>,
    /// Kind of emergency (e.g. "drowning", "medical").
    pub alert_type: String,
    /// Severity.
    pub severity: AlertSeverity,
    /// Handling status.
    pub status: AlertStatus,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// When the alert was raised.
    pub created_at: DateTime<Utc>,
}

/// Latest weather observation for a center. Consumed, never computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WeatherSnapshot {
    /// Center the observation belongs to.
    pub center_id: CenterId,
    /// Air temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Wind speed in km/h.
    pub wind_speed_kmh: f64,
    /// Significant wave height in metres.
    #[serde(default)]
    pub wave_height_m: Option<f64>,
    /// Short description ("sunny", "overcast", ...).
    pub conditions: String,
    /// Observation time.
    pub recorded_at: DateTime<Utc>,
}

/// A lifeguard account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Lifeguard {
    /// Lifeguard identity.
    pub id: LifeguardId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Home center, if assigned.
    #[serde(default)]
    pub center_id: Option<CenterId>,
    /// Account-active flag.
    pub is_active: bool,
}

/// A supervised stretch of beach belonging to a center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Zone {
    /// Zone identity.
    pub id: ZoneId,
    /// Owning center.
    pub center_id: CenterId,
    /// Display name.
    pub name: String,
    /// Whether the zone is currently supervised.
    pub is_active: bool,
}

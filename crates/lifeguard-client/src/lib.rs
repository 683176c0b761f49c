//! Data access collaborator for the lifeguard operation.
//!
//! The collaborator is the sole mutable source of truth for shifts, flags,
//! alerts, weather, staff and zones. Dashboards and the realtime
//! coordinator reach it through [`DataAccess`], which dispatches to either
//! the REST API ([`HttpBackend`]) or an in-process store
//! ([`MemoryBackend`]) used by tests and local demos.
//!
//! Uses enum dispatch rather than trait objects because async methods are
//! not dyn-compatible.

pub mod error;
pub mod http;
pub mod memory;

use lifeguard_types::{
    Alert, AlertId, AlertStatus, CenterId, FlagDraft, FlagHistoryPage, FlagId, GeoPoint,
    Lifeguard, LifeguardId, NewShift, SafetyFlag, Shift, ShiftId, ShiftPatch, WeatherSnapshot,
    Zone,
};

pub use error::DataAccessError;
pub use http::HttpBackend;
pub use memory::MemoryBackend;

/// Every collaborator operation, named for logging and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `listShifts`
    ListShifts,
    /// `listShiftsForLifeguard`
    ListShiftsForLifeguard,
    /// `createShift`
    CreateShift,
    /// `updateShift`
    UpdateShift,
    /// `deleteShift`
    DeleteShift,
    /// `checkIn`
    CheckIn,
    /// `checkOut`
    CheckOut,
    /// `listSafetyFlagHistory`
    FlagHistory,
    /// `createFlag`
    CreateFlag,
    /// `updateFlag`
    UpdateFlag,
    /// `deleteFlag`
    DeleteFlag,
    /// `listAlerts`
    ListAlerts,
    /// `updateAlertStatus`
    UpdateAlertStatus,
    /// `getCurrentWeather`
    CurrentWeather,
    /// `listLifeguards`
    ListLifeguards,
    /// `listZones`
    ListZones,
}

impl Endpoint {
    /// Short name used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListShifts => "list_shifts",
            Self::ListShiftsForLifeguard => "list_shifts_for_lifeguard",
            Self::CreateShift => "create_shift",
            Self::UpdateShift => "update_shift",
            Self::DeleteShift => "delete_shift",
            Self::CheckIn => "check_in",
            Self::CheckOut => "check_out",
            Self::FlagHistory => "flag_history",
            Self::CreateFlag => "create_flag",
            Self::UpdateFlag => "update_flag",
            Self::DeleteFlag => "delete_flag",
            Self::ListAlerts => "list_alerts",
            Self::UpdateAlertStatus => "update_alert_status",
            Self::CurrentWeather => "current_weather",
            Self::ListLifeguards => "list_lifeguards",
            Self::ListZones => "list_zones",
        }
    }
}

impl core::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data access backend.
pub enum DataAccess {
    /// The REST API.
    Http(HttpBackend),
    /// In-process store.
    Memory(MemoryBackend),
}

impl DataAccess {
    /// Human-readable backend name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Http(_) => "http",
            Self::Memory(_) => "memory",
        }
    }

    /// Every shift visible to the caller.
    pub async fn list_shifts(&self) -> Result<Vec<Shift>, DataAccessError> {
        match self {
            Self::Http(b) => b.list_shifts().await,
            Self::Memory(b) => b.list_shifts().await,
        }
    }

    /// Shifts assigned to one lifeguard.
    pub async fn list_shifts_for_lifeguard(
        &self,
        id: LifeguardId,
    ) -> Result<Vec<Shift>, DataAccessError> {
        match self {
            Self::Http(b) => b.list_shifts_for_lifeguard(id).await,
            Self::Memory(b) => b.list_shifts_for_lifeguard(id).await,
        }
    }

    /// Create a shift.
    pub async fn create_shift(&self, req: &NewShift) -> Result<Shift, DataAccessError> {
        match self {
            Self::Http(b) => b.create_shift(req).await,
            Self::Memory(b) => b.create_shift(req).await,
        }
    }

    /// Apply an administrative edit.
    pub async fn update_shift(
        &self,
        id: ShiftId,
        patch: &ShiftPatch,
    ) -> Result<Shift, DataAccessError> {
        match self {
            Self::Http(b) => b.update_shift(id, patch).await,
            Self::Memory(b) => b.update_shift(id, patch).await,
        }
    }

    /// Delete a shift.
    pub async fn delete_shift(&self, id: ShiftId) -> Result<(), DataAccessError> {
        match self {
            Self::Http(b) => b.delete_shift(id).await,
            Self::Memory(b) => b.delete_shift(id).await,
        }
    }

    /// Record a check-in at `location`.
    pub async fn check_in(&self, id: ShiftId, location: GeoPoint) -> Result<Shift, DataAccessError> {
        match self {
            Self::Http(b) => b.check_in(id, location).await,
            Self::Memory(b) => b.check_in(id, location).await,
        }
    }

    /// Record a check-out.
    pub async fn check_out(&self, id: ShiftId) -> Result<Shift, DataAccessError> {
        match self {
            Self::Http(b) => b.check_out(id).await,
            Self::Memory(b) => b.check_out(id).await,
        }
    }

    /// One page of a center's flag history, most recent first.
    pub async fn list_safety_flag_history(
        &self,
        center_id: CenterId,
        page: u32,
        page_size: u32,
    ) -> Result<FlagHistoryPage, DataAccessError> {
        match self {
            Self::Http(b) => b.list_safety_flag_history(center_id, page, page_size).await,
            Self::Memory(b) => b.list_safety_flag_history(center_id, page, page_size).await,
        }
    }

    /// Set a new flag for a center.
    pub async fn create_flag(
        &self,
        center_id: CenterId,
        draft: &FlagDraft,
    ) -> Result<SafetyFlag, DataAccessError> {
        match self {
            Self::Http(b) => b.create_flag(center_id, draft).await,
            Self::Memory(b) => b.create_flag(center_id, draft).await,
        }
    }

    /// Edit an existing flag.
    pub async fn update_flag(
        &self,
        id: FlagId,
        draft: &FlagDraft,
    ) -> Result<SafetyFlag, DataAccessError> {
        match self {
            Self::Http(b) => b.update_flag(id, draft).await,
            Self::Memory(b) => b.update_flag(id, draft).await,
        }
    }

    /// Remove a flag from the history.
    pub async fn delete_flag(&self, id: FlagId) -> Result<(), DataAccessError> {
        match self {
            Self::Http(b) => b.delete_flag(id).await,
            Self::Memory(b) => b.delete_flag(id).await,
        }
    }

    /// Every alert visible to the caller.
    pub async fn list_alerts(&self) -> Result<Vec<Alert>, DataAccessError> {
        match self {
            Self::Http(b) => b.list_alerts().await,
            Self::Memory(b) => b.list_alerts().await,
        }
    }

    /// Move an alert to `status`.
    pub async fn update_alert_status(
        &self,
        id: AlertId,
        status: AlertStatus,
    ) -> Result<Alert, DataAccessError> {
        match self {
            Self::Http(b) => b.update_alert_status(id, status).await,
            Self::Memory(b) => b.update_alert_status(id, status).await,
        }
    }

    /// Latest weather observation for a center.
    pub async fn get_current_weather(
        &self,
        center_id: CenterId,
    ) -> Result<WeatherSnapshot, DataAccessError> {
        match self {
            Self::Http(b) => b.get_current_weather(center_id).await,
            Self::Memory(b) => b.get_current_weather(center_id).await,
        }
    }

    /// Every lifeguard account.
    pub async fn list_lifeguards(&self) -> Result<Vec<Lifeguard>, DataAccessError> {
        match self {
            Self::Http(b) => b.list_lifeguards().await,
            Self::Memory(b) => b.list_lifeguards().await,
        }
    }

    /// Zones belonging to a center.
    pub async fn list_zones(&self, center_id: CenterId) -> Result<Vec<Zone>, DataAccessError> {
        match self {
            Self::Http(b) => b.list_zones(center_id).await,
            Self::Memory(b) => b.list_zones(center_id).await,
        }
    }
}

impl From<HttpBackend> for DataAccess {
    fn from(backend: HttpBackend) -> Self {
        Self::Http(backend)
    }
}

impl From<MemoryBackend> for DataAccess {
    fn from(backend: MemoryBackend) -> Self {
        Self::Memory(backend)
    }
}

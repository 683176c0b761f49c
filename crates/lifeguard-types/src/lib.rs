//! Shared type definitions for the lifeguard shift and site-safety core.
//!
//! This crate is the single source of truth for the records exchanged with
//! the data access collaborator and the realtime channel. Types flow to
//! `TypeScript` via `ts-rs` for the dashboards.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for every entity identifier
//! - [`enums`] -- Shift, flag and alert status enumerations
//! - [`structs`] -- Shifts, flags, alerts, weather, staff and zones
//! - [`events`] -- Realtime push events and subscription scopes

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AlertSeverity, AlertStatus, FlagStatus, ShiftStatus};
pub use events::{EventKind, PushEvent, Scope};
pub use ids::{AlertId, CenterId, FlagId, LifeguardId, ShiftId, ZoneId};
pub use structs::{
    Alert, DayOfWeek, FlagDraft, FlagHistoryPage, GeoPoint, Lifeguard, NewShift, Pagination,
    SafetyFlag, ScheduleTemplate, Shift, ShiftPatch, WeatherSnapshot, Zone,
};

//! In-process collaborator backend.
//!
//! Holds every record behind a single `tokio` mutex and applies the same
//! acceptance rules the REST API does: shift intervals must end after
//! they start, check-in goes through the eligibility window, flag
//! history pages come back most recent first. Used by tests and local
//! demos, with per-endpoint call counters and failure injection.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lifeguard_core::clock::Clock;
use lifeguard_core::shift::{self as lifecycle, CheckInPolicy};
use lifeguard_types::{
    Alert, AlertId, AlertStatus, CenterId, FlagDraft, FlagHistoryPage, FlagId, GeoPoint,
    Lifeguard, LifeguardId, NewShift, Pagination, SafetyFlag, Shift, ShiftId, ShiftPatch,
    ShiftStatus, WeatherSnapshot, Zone, ZoneId,
};
use tokio::sync::Mutex;

use crate::Endpoint;
use crate::error::DataAccessError;

const BAD_REQUEST: u16 = 400;

/// Name and email stamped on flags created through this backend.
const DEFAULT_ACTOR: (&str, &str) = ("Center Admin", "admin@lifeguard.local");

#[derive(Default)]
struct Store {
    shifts: Vec<Shift>,
    /// Newest first.
    flags: Vec<SafetyFlag>,
    alerts: Vec<Alert>,
    weather: HashMap<CenterId, WeatherSnapshot>,
    lifeguards: Vec<Lifeguard>,
    zones: Vec<Zone>,
    calls: HashMap<Endpoint, usize>,
    failures: HashMap<Endpoint, DataAccessError>,
}

/// Collaborator backed by process memory. Clones share the same store.
#[derive(Clone)]
pub struct MemoryBackend {
    store: Arc<Mutex<Store>>,
    clock: Arc<dyn Clock>,
    policy: CheckInPolicy,
}

impl MemoryBackend {
    /// Create an empty store reading "now" from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            clock,
            policy: CheckInPolicy::default(),
        }
    }

    /// Use `policy` for check-in acceptance instead of the default windows.
    #[must_use]
    pub fn with_policy(mut self, policy: CheckInPolicy) -> Self {
        self.policy = policy;
        self
    }

    // -- seeding ------------------------------------------------------------

    /// Insert a shift as-is.
    pub async fn seed_shift(&self, shift: Shift) {
        self.store.lock().await.shifts.push(shift);
    }

    /// Insert a flag as-is, keeping the history ordered newest first.
    pub async fn seed_flag(&self, flag: SafetyFlag) {
        insert_newest_first(&mut self.store.lock().await.flags, flag);
    }

    /// Insert an alert as-is.
    pub async fn seed_alert(&self, alert: Alert) {
        self.store.lock().await.alerts.push(alert);
    }

    /// Replace a center's current weather.
    pub async fn seed_weather(&self, weather: WeatherSnapshot) {
        self.store
            .lock()
            .await
            .weather
            .insert(weather.center_id, weather);
    }

    /// Insert a lifeguard account.
    pub async fn seed_lifeguard(&self, lifeguard: Lifeguard) {
        self.store.lock().await.lifeguards.push(lifeguard);
    }

    /// Insert a zone.
    pub async fn seed_zone(&self, zone: Zone) {
        self.store.lock().await.zones.push(zone);
    }

    /// Flip a zone's supervised flag.
    pub async fn set_zone_active(&self, id: ZoneId, active: bool) {
        let mut store = self.store.lock().await;
        if let Some(zone) = store.zones.iter_mut().find(|z| z.id == id) {
            zone.is_active = active;
        }
    }

    // -- failure injection ----------------------------------------------------

    /// Make every call to `endpoint` fail with `error` until cleared.
    pub async fn fail(&self, endpoint: Endpoint, error: DataAccessError) {
        self.store.lock().await.failures.insert(endpoint, error);
    }

    /// Stop failing calls to `endpoint`.
    pub async fn clear_failure(&self, endpoint: Endpoint) {
        self.store.lock().await.failures.remove(&endpoint);
    }

    /// How many times `endpoint` has been called, failed calls included.
    pub async fn call_count(&self, endpoint: Endpoint) -> usize {
        self.store
            .lock()
            .await
            .calls
            .get(&endpoint)
            .copied()
            .unwrap_or(0)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Count the call and return the injected failure, if any.
    fn enter(store: &mut Store, endpoint: Endpoint) -> Result<(), DataAccessError> {
        let count = store.calls.entry(endpoint).or_insert(0);
        *count = count.saturating_add(1);
        store.failures.get(&endpoint).cloned().map_or(Ok(()), Err)
    }

    fn shift_mut(store: &mut Store, id: ShiftId) -> Result<&mut Shift, DataAccessError> {
        store
            .shifts
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| DataAccessError::not_found("shift", id))
    }

    // -- shifts ----------------------------------------------------------------

    pub(crate) async fn list_shifts(&self) -> Result<Vec<Shift>, DataAccessError> {
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::ListShifts)?;
        Ok(store.shifts.clone())
    }

    pub(crate) async fn list_shifts_for_lifeguard(
        &self,
        id: LifeguardId,
    ) -> Result<Vec<Shift>, DataAccessError> {
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::ListShiftsForLifeguard)?;
        Ok(store
            .shifts
            .iter()
            .filter(|s| s.lifeguard_id == id)
            .cloned()
            .collect())
    }

    pub(crate) async fn create_shift(&self, req: &NewShift) -> Result<Shift, DataAccessError> {
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::CreateShift)?;
        lifecycle::validate_interval(req.start_time, req.end_time).map_err(rejected)?;

        let now = self.now();
        let lifeguard_name = store
            .lifeguards
            .iter()
            .find(|l| l.id == req.lifeguard_id)
            .map(|l| l.name.clone());
        let created = Shift {
            id: ShiftId::new(),
            lifeguard_id: req.lifeguard_id,
            center_id: req.center_id,
            start_time: req.start_time,
            end_time: req.end_time,
            status: ShiftStatus::Scheduled,
            check_in_time: None,
            check_in_location: None,
            check_out_time: None,
            lifeguard_name,
            center_name: None,
            created_at: now,
            updated_at: now,
        };
        store.shifts.push(created.clone());
        Ok(created)
    }

    pub(crate) async fn update_shift(
        &self,
        id: ShiftId,
        patch: &ShiftPatch,
    ) -> Result<Shift, DataAccessError> {
        let now = self.now();
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::UpdateShift)?;
        let shift = Self::shift_mut(&mut store, id)?;
        lifecycle::validate_patch(shift, patch).map_err(rejected)?;

        if let Some(lifeguard_id) = patch.lifeguard_id {
            shift.lifeguard_id = lifeguard_id;
        }
        if let Some(start) = patch.start_time {
            shift.start_time = start;
        }
        if let Some(end) = patch.end_time {
            shift.end_time = end;
        }
        if let Some(status) = patch.status {
            shift.status = status;
        }
        shift.updated_at = now;
        Ok(shift.clone())
    }

    pub(crate) async fn delete_shift(&self, id: ShiftId) -> Result<(), DataAccessError> {
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::DeleteShift)?;
        let before = store.shifts.len();
        store.shifts.retain(|s| s.id != id);
        if store.shifts.len() == before {
            return Err(DataAccessError::not_found("shift", id));
        }
        Ok(())
    }

    pub(crate) async fn check_in(
        &self,
        id: ShiftId,
        location: GeoPoint,
    ) -> Result<Shift, DataAccessError> {
        let now = self.now();
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::CheckIn)?;
        let shift = Self::shift_mut(&mut store, id)?;
        lifecycle::request_check_in(shift, location, now, &self.policy).map_err(rejected)?;
        Ok(shift.clone())
    }

    pub(crate) async fn check_out(&self, id: ShiftId) -> Result<Shift, DataAccessError> {
        let now = self.now();
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::CheckOut)?;
        let shift = Self::shift_mut(&mut store, id)?;
        lifecycle::request_check_out(shift, now).map_err(rejected)?;
        Ok(shift.clone())
    }

    // -- flags -------------------------------------------------------------------

    pub(crate) async fn list_safety_flag_history(
        &self,
        center_id: CenterId,
        page: u32,
        page_size: u32,
    ) -> Result<FlagHistoryPage, DataAccessError> {
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::FlagHistory)?;

        let page = page.max(1);
        let page_size = page_size.max(1);
        let matching: Vec<&SafetyFlag> = store
            .flags
            .iter()
            .filter(|f| f.center_id == center_id)
            .collect();
        let total = matching.len();
        let skip = usize::try_from(page.saturating_sub(1).saturating_mul(page_size))
            .unwrap_or(usize::MAX);
        let take = usize::try_from(page_size).unwrap_or(usize::MAX);
        let flags = matching
            .into_iter()
            .skip(skip)
            .take(take)
            .cloned()
            .collect();
        let total_pages = u32::try_from(total.div_ceil(take)).unwrap_or(u32::MAX);

        Ok(FlagHistoryPage {
            flags,
            pagination: Pagination {
                page,
                page_size,
                total: u64::try_from(total).unwrap_or(u64::MAX),
                total_pages,
            },
        })
    }

    pub(crate) async fn create_flag(
        &self,
        center_id: CenterId,
        draft: &FlagDraft,
    ) -> Result<SafetyFlag, DataAccessError> {
        let now = self.now();
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::CreateFlag)?;
        lifeguard_core::flag::validate_draft(draft, now).map_err(rejected)?;

        let (name, email) = DEFAULT_ACTOR;
        let flag = SafetyFlag {
            id: FlagId::new(),
            center_id,
            status: draft.status,
            reason: draft.reason.clone(),
            set_by_name: name.to_owned(),
            set_by_email: email.to_owned(),
            set_at: now,
            expires_at: draft.expires_at,
            created_at: now,
        };
        insert_newest_first(&mut store.flags, flag.clone());
        Ok(flag)
    }

    pub(crate) async fn update_flag(
        &self,
        id: FlagId,
        draft: &FlagDraft,
    ) -> Result<SafetyFlag, DataAccessError> {
        let now = self.now();
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::UpdateFlag)?;
        lifeguard_core::flag::validate_draft(draft, now).map_err(rejected)?;
        let flag = store
            .flags
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| DataAccessError::not_found("flag", id))?;
        flag.status = draft.status;
        flag.reason.clone_from(&draft.reason);
        flag.expires_at = draft.expires_at;
        Ok(flag.clone())
    }

    pub(crate) async fn delete_flag(&self, id: FlagId) -> Result<(), DataAccessError> {
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::DeleteFlag)?;
        let before = store.flags.len();
        store.flags.retain(|f| f.id != id);
        if store.flags.len() == before {
            return Err(DataAccessError::not_found("flag", id));
        }
        Ok(())
    }

    // -- alerts, weather, staff, zones --------------------------------------------

    pub(crate) async fn list_alerts(&self) -> Result<Vec<Alert>, DataAccessError> {
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::ListAlerts)?;
        Ok(store.alerts.clone())
    }

    pub(crate) async fn update_alert_status(
        &self,
        id: AlertId,
        status: AlertStatus,
    ) -> Result<Alert, DataAccessError> {
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::UpdateAlertStatus)?;
        let alert = store
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| DataAccessError::not_found("alert", id))?;
        alert.status = status;
        Ok(alert.clone())
    }

    pub(crate) async fn get_current_weather(
        &self,
        center_id: CenterId,
    ) -> Result<WeatherSnapshot, DataAccessError> {
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::CurrentWeather)?;
        store
            .weather
            .get(&center_id)
            .cloned()
            .ok_or_else(|| DataAccessError::not_found("weather", center_id))
    }

    pub(crate) async fn list_lifeguards(&self) -> Result<Vec<Lifeguard>, DataAccessError> {
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::ListLifeguards)?;
        Ok(store.lifeguards.clone())
    }

    pub(crate) async fn list_zones(&self, center_id: CenterId) -> Result<Vec<Zone>, DataAccessError> {
        let mut store = self.store.lock().await;
        Self::enter(&mut store, Endpoint::ListZones)?;
        Ok(store
            .zones
            .iter()
            .filter(|z| z.center_id == center_id)
            .cloned()
            .collect())
    }
}

/// Local rule violations come back the way the API reports them.
fn rejected(err: lifeguard_core::LifecycleError) -> DataAccessError {
    DataAccessError::rejected(BAD_REQUEST, err.to_string())
}

/// Keep the history ordered by `set_at`, newest first. Ties keep the
/// most recent insertion in front.
fn insert_newest_first(flags: &mut Vec<SafetyFlag>, flag: SafetyFlag) {
    flags.insert(0, flag);
    flags.sort_by(|a, b| b.set_at.cmp(&a.set_at));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use lifeguard_core::clock::ManualClock;
    use lifeguard_types::FlagStatus;

    use super::*;

    fn nine_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 7, 9, 0, 0).unwrap()
    }

    fn backend() -> (Arc<ManualClock>, MemoryBackend) {
        let clock = Arc::new(ManualClock::new(nine_am() - TimeDelta::minutes(30)));
        let backend = MemoryBackend::new(clock.clone());
        (clock, backend)
    }

    fn request(lifeguard_id: LifeguardId) -> NewShift {
        NewShift {
            lifeguard_id,
            center_id: CenterId::new(),
            start_time: nine_am(),
            end_time: nine_am() + TimeDelta::hours(8),
        }
    }

    fn draft(status: FlagStatus) -> FlagDraft {
        FlagDraft {
            status,
            reason: "conditions".to_owned(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn inverted_interval_is_rejected_with_a_message() {
        let (_, backend) = backend();
        let mut req = request(LifeguardId::new());
        req.end_time = req.start_time;
        let err = backend.create_shift(&req).await.unwrap_err();
        assert!(err.server_message().is_some());
        assert!(backend.list_shifts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn shift_lifecycle_round_trip() {
        let (clock, backend) = backend();
        let lifeguard = LifeguardId::new();
        let created = backend.create_shift(&request(lifeguard)).await.unwrap();
        assert_eq!(created.status, ShiftStatus::Scheduled);

        let here = GeoPoint {
            latitude: 36.7,
            longitude: -4.4,
        };
        let active = backend.check_in(created.id, here).await.unwrap();
        assert_eq!(active.status, ShiftStatus::Active);
        assert_eq!(active.check_in_time, Some(clock.now()));

        clock.advance(TimeDelta::hours(9));
        let done = backend.check_out(created.id).await.unwrap();
        assert_eq!(done.status, ShiftStatus::Completed);
        assert!(backend.check_out(created.id).await.is_err());

        let mine = backend.list_shifts_for_lifeguard(lifeguard).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(
            backend
                .list_shifts_for_lifeguard(LifeguardId::new())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn check_in_outside_window_is_refused() {
        let (clock, backend) = backend();
        let created = backend.create_shift(&request(LifeguardId::new())).await.unwrap();
        clock.set(nine_am() - TimeDelta::hours(2));
        let err = backend
            .check_in(
                created.id,
                GeoPoint {
                    latitude: 0.0,
                    longitude: 0.0,
                },
            )
            .await
            .unwrap_err();
        assert!(err.server_message().unwrap_or_default().contains("too early"));
    }

    #[tokio::test]
    async fn flag_history_is_newest_first_and_paged() {
        let (clock, backend) = backend();
        let center = CenterId::new();
        for status in [FlagStatus::Green, FlagStatus::Yellow, FlagStatus::Red] {
            backend.create_flag(center, &draft(status)).await.unwrap();
            clock.advance(TimeDelta::minutes(10));
        }
        backend
            .create_flag(CenterId::new(), &draft(FlagStatus::Black))
            .await
            .unwrap();

        let first = backend.list_safety_flag_history(center, 1, 2).await.unwrap();
        let statuses: Vec<_> = first.flags.iter().map(|f| f.status).collect();
        assert_eq!(statuses, vec![FlagStatus::Red, FlagStatus::Yellow]);
        assert_eq!(first.pagination.total, 3);
        assert_eq!(first.pagination.total_pages, 2);

        let second = backend.list_safety_flag_history(center, 2, 2).await.unwrap();
        assert_eq!(second.flags.len(), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_counted_and_cleared() {
        let (_, backend) = backend();
        backend
            .fail(Endpoint::ListAlerts, DataAccessError::Transport("down".into()))
            .await;
        assert!(backend.list_alerts().await.is_err());
        assert!(backend.list_alerts().await.is_err());
        backend.clear_failure(Endpoint::ListAlerts).await;
        assert!(backend.list_alerts().await.is_ok());
        assert_eq!(backend.call_count(Endpoint::ListAlerts).await, 3);
        assert_eq!(backend.call_count(Endpoint::ListShifts).await, 0);
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let (_, backend) = backend();
        assert!(matches!(
            backend.delete_shift(ShiftId::new()).await,
            Err(DataAccessError::NotFound { resource: "shift", .. })
        ));
        assert!(matches!(
            backend.get_current_weather(CenterId::new()).await,
            Err(DataAccessError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn created_flag_is_placed_by_set_time() {
        let (clock, backend) = backend();
        let center = CenterId::new();
        let earliest = backend.create_flag(center, &draft(FlagStatus::Green)).await.unwrap();
        let mut seeded = earliest.clone();
        seeded.id = FlagId::new();
        seeded.status = FlagStatus::Black;
        seeded.set_at = clock.now() + TimeDelta::hours(2);
        backend.seed_flag(seeded.clone()).await;

        clock.advance(TimeDelta::minutes(10));
        let created = backend.create_flag(center, &draft(FlagStatus::Yellow)).await.unwrap();

        let page = backend.list_safety_flag_history(center, 1, 10).await.unwrap();
        let order: Vec<FlagId> = page.flags.iter().map(|f| f.id).collect();
        assert_eq!(order, vec![seeded.id, created.id, earliest.id]);
    }
}

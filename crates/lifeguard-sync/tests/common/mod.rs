//! Shared fixture: an in-memory collaborator, an in-process channel and a
//! manual clock pinned to Monday 2025-07-07 08:30 UTC.

#![allow(clippy::unwrap_used, dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use lifeguard_client::{DataAccess, MemoryBackend};
use lifeguard_core::clock::{Clock, ManualClock};
use lifeguard_sync::{
    LocalChannel, RealtimeChannel, SyncDeps, SyncHandle, SyncHandlers, SyncSettings,
    mount_realtime_sync,
};
use lifeguard_types::{
    Alert, AlertId, AlertSeverity, AlertStatus, CenterId, LifeguardId, Scope, Shift, ShiftId,
    ShiftStatus, WeatherSnapshot,
};

pub struct Fixture {
    pub memory: MemoryBackend,
    pub local: LocalChannel,
    pub clock: Arc<ManualClock>,
    pub center: CenterId,
}

impl Fixture {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 7, 7, 8, 30, 0).unwrap(),
        ));
        Self {
            memory: MemoryBackend::new(clock.clone()),
            local: LocalChannel::new(),
            clock,
            center: CenterId::new(),
        }
    }

    pub fn deps(&self, settings: SyncSettings) -> SyncDeps {
        SyncDeps {
            access: Arc::new(DataAccess::Memory(self.memory.clone())),
            channel: Arc::new(RealtimeChannel::Local(self.local.clone())),
            clock: self.clock.clone(),
            settings,
        }
    }

    pub async fn mount(&self, handlers: SyncHandlers) -> SyncHandle {
        self.mount_on(Scope::center(self.center), handlers, SyncSettings::default())
            .await
    }

    pub async fn mount_on(
        &self,
        scope: Scope,
        handlers: SyncHandlers,
        settings: SyncSettings,
    ) -> SyncHandle {
        let handle = mount_realtime_sync(scope, handlers, self.deps(settings))
            .await
            .unwrap();
        settle().await;
        handle
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn alert(&self, center_id: Option<CenterId>) -> Alert {
        Alert {
            id: AlertId::new(),
            center_id,
            alert_type: "drowning".to_owned(),
            severity: AlertSeverity::Critical,
            status: AlertStatus::Active,
            description: Some("swimmer in distress".to_owned()),
            created_at: self.now(),
        }
    }

    pub fn weather(&self, center_id: CenterId) -> WeatherSnapshot {
        WeatherSnapshot {
            center_id,
            temperature_c: 27.5,
            wind_speed_kmh: 18.0,
            wave_height_m: Some(1.2),
            conditions: "sunny".to_owned(),
            recorded_at: self.now(),
        }
    }

    /// A scheduled shift today from 09:00 to 17:00.
    pub fn todays_shift(&self, lifeguard_id: LifeguardId) -> Shift {
        let start = Utc.with_ymd_and_hms(2025, 7, 7, 9, 0, 0).unwrap();
        Shift {
            id: ShiftId::new(),
            lifeguard_id,
            center_id: self.center,
            start_time: start,
            end_time: start + TimeDelta::hours(8),
            status: ShiftStatus::Scheduled,
            check_in_time: None,
            check_in_location: None,
            check_out_time: None,
            lifeguard_name: Some("Alex".to_owned()),
            center_name: Some("North Beach".to_owned()),
            created_at: self.now(),
            updated_at: self.now(),
        }
    }
}

/// Let every ready task run. With a paused clock the runtime only moves
/// time forward once nothing else can make progress.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

//! Narrow refresh functions, one per data domain.
//!
//! An event re-fetches only the domain it implicates. Every function is
//! parameterized by scope and is idempotent: running it twice against an
//! unchanged collaborator yields the same action.

use std::sync::Arc;

use lifeguard_client::{DataAccess, DataAccessError};
use lifeguard_core::clock::Clock;
use lifeguard_core::flag::resolve_current_flag;
use lifeguard_types::{CenterId, Scope};
use tracing::{debug, warn};

use crate::settings::SyncSettings;
use crate::state::{Action, DashboardStore, FlagDisplay};

/// A slice of dashboard state that can be reloaded on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    /// Open alert count.
    Alerts,
    /// Shift list.
    Shifts,
    /// Active lifeguard count.
    Lifeguards,
    /// Current safety flag.
    Flag,
    /// Latest weather observation.
    Weather,
    /// Active zone count.
    Zones,
}

impl Domain {
    /// Short name used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alerts => "alerts",
            Self::Shifts => "shifts",
            Self::Lifeguards => "lifeguards",
            Self::Flag => "flag",
            Self::Weather => "weather",
            Self::Zones => "zones",
        }
    }
}

impl core::fmt::Display for Domain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a refresh needs, shared by the event loop and the gateway.
pub struct RefreshContext {
    /// The collaborator.
    pub access: Arc<DataAccess>,
    /// Source of "now" for flag resolution.
    pub clock: Arc<dyn Clock>,
    /// Scope the dashboard is mounted on.
    pub scope: Scope,
    /// Page size and roster settings.
    pub settings: SyncSettings,
}

impl RefreshContext {
    fn in_scope(&self, center_id: Option<CenterId>) -> bool {
        match self.scope {
            Scope::System => true,
            Scope::Center { center_id: mine } => center_id == Some(mine),
        }
    }

    /// Fetch `domain` and turn it into a state action.
    ///
    /// Returns `Ok(None)` for domains that need a center when the scope is
    /// system-wide (flag, weather, zones).
    ///
    /// # Errors
    ///
    /// Returns the collaborator error unchanged.
    pub async fn load(&self, domain: Domain) -> Result<Option<Action>, DataAccessError> {
        match domain {
            Domain::Alerts => {
                let alerts = self.access.list_alerts().await?;
                let open = alerts
                    .iter()
                    .filter(|a| a.status.is_open() && self.in_scope(a.center_id))
                    .count();
                Ok(Some(Action::AlertsLoaded(open)))
            }
            Domain::Shifts => {
                let shifts = match self.settings.lifeguard {
                    Some(id) => self.access.list_shifts_for_lifeguard(id).await?,
                    None => {
                        let mut all = self.access.list_shifts().await?;
                        all.retain(|s| self.in_scope(Some(s.center_id)));
                        all
                    }
                };
                Ok(Some(Action::ShiftsLoaded(shifts)))
            }
            Domain::Lifeguards => {
                let lifeguards = self.access.list_lifeguards().await?;
                let active = lifeguards
                    .iter()
                    .filter(|l| l.is_active && self.in_scope(l.center_id))
                    .count();
                Ok(Some(Action::LifeguardsLoaded(active)))
            }
            Domain::Flag => {
                let Some(center_id) = self.scope.center_id() else {
                    return Ok(None);
                };
                let page = self
                    .access
                    .list_safety_flag_history(center_id, 1, self.settings.flag_page_size)
                    .await?;
                let display = resolve_current_flag(&page.flags, self.clock.now())
                    .map_or(FlagDisplay::NotSet, |flag| FlagDisplay::Set(flag.clone()));
                Ok(Some(Action::FlagResolved(display)))
            }
            Domain::Weather => {
                let Some(center_id) = self.scope.center_id() else {
                    return Ok(None);
                };
                let weather = self.access.get_current_weather(center_id).await?;
                Ok(Some(Action::WeatherLoaded(weather)))
            }
            Domain::Zones => {
                let Some(center_id) = self.scope.center_id() else {
                    return Ok(None);
                };
                let zones = self.access.list_zones(center_id).await?;
                let active = zones.iter().filter(|z| z.is_active).count();
                Ok(Some(Action::ZonesLoaded(active)))
            }
        }
    }
}

/// Reload `domain` and apply it to `store`.
///
/// A failed load is logged and leaves the previous value in place.
pub async fn refresh(ctx: &RefreshContext, store: &DashboardStore, domain: Domain) {
    match ctx.load(domain).await {
        Ok(Some(action)) => {
            if !store.dispatch(action) {
                debug!(domain = %domain, "view torn down before refresh completed");
            }
        }
        Ok(None) => {
            debug!(domain = %domain, scope = %ctx.scope, "domain not applicable to scope");
        }
        Err(e) => {
            warn!(
                domain = %domain,
                scope = %ctx.scope,
                error = %e,
                "refresh failed, keeping previous state"
            );
        }
    }
}

/// Run [`refresh`] on its own task.
pub fn spawn_refresh(ctx: &Arc<RefreshContext>, store: &Arc<DashboardStore>, domain: Domain) {
    let ctx = Arc::clone(ctx);
    let store = Arc::clone(store);
    tokio::spawn(async move {
        refresh(&ctx, &store, domain).await;
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use lifeguard_client::{Endpoint, MemoryBackend};
    use lifeguard_core::clock::ManualClock;
    use lifeguard_types::{
        Alert, AlertId, AlertSeverity, AlertStatus, FlagDraft, FlagStatus, Lifeguard, LifeguardId,
    };

    use super::*;

    struct Fixture {
        memory: MemoryBackend,
        clock: Arc<ManualClock>,
        center: CenterId,
    }

    impl Fixture {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2025, 7, 7, 10, 0, 0).unwrap(),
            ));
            Self {
                memory: MemoryBackend::new(clock.clone()),
                clock,
                center: CenterId::new(),
            }
        }

        fn context(&self, scope: Scope) -> RefreshContext {
            RefreshContext {
                access: Arc::new(DataAccess::Memory(self.memory.clone())),
                clock: self.clock.clone(),
                scope,
                settings: SyncSettings::default(),
            }
        }

        fn alert(&self, center_id: Option<CenterId>, status: AlertStatus) -> Alert {
            Alert {
                id: AlertId::new(),
                center_id,
                alert_type: "drowning".to_owned(),
                severity: AlertSeverity::Critical,
                status,
                description: None,
                created_at: self.clock.now(),
            }
        }
    }

    #[tokio::test]
    async fn alert_count_is_scoped_and_open_only() {
        let fx = Fixture::new();
        let other = CenterId::new();
        for alert in [
            fx.alert(Some(fx.center), AlertStatus::Active),
            fx.alert(Some(fx.center), AlertStatus::Responding),
            fx.alert(Some(fx.center), AlertStatus::Resolved),
            fx.alert(Some(other), AlertStatus::Active),
            fx.alert(None, AlertStatus::Active),
        ] {
            fx.memory.seed_alert(alert).await;
        }

        let center = fx.context(Scope::center(fx.center));
        assert_eq!(
            center.load(Domain::Alerts).await.unwrap(),
            Some(Action::AlertsLoaded(2))
        );
        let system = fx.context(Scope::System);
        assert_eq!(
            system.load(Domain::Alerts).await.unwrap(),
            Some(Action::AlertsLoaded(4))
        );
    }

    #[tokio::test]
    async fn active_lifeguards_means_account_active() {
        let fx = Fixture::new();
        for (active, center) in [(true, Some(fx.center)), (false, Some(fx.center)), (true, None)] {
            fx.memory
                .seed_lifeguard(Lifeguard {
                    id: LifeguardId::new(),
                    name: "Guard".to_owned(),
                    email: "guard@example.org".to_owned(),
                    center_id: center,
                    is_active: active,
                })
                .await;
        }
        let ctx = fx.context(Scope::center(fx.center));
        assert_eq!(
            ctx.load(Domain::Lifeguards).await.unwrap(),
            Some(Action::LifeguardsLoaded(1))
        );
    }

    #[tokio::test]
    async fn flag_domain_resolves_current_flag() {
        let fx = Fixture::new();
        let ctx = fx.context(Scope::center(fx.center));
        assert_eq!(
            ctx.load(Domain::Flag).await.unwrap(),
            Some(Action::FlagResolved(FlagDisplay::NotSet))
        );

        let draft = FlagDraft {
            status: FlagStatus::Yellow,
            reason: "wind".to_owned(),
            expires_at: Some(fx.clock.now() + TimeDelta::hours(1)),
        };
        let flag = ctx.access.create_flag(fx.center, &draft).await.unwrap();
        assert_eq!(
            ctx.load(Domain::Flag).await.unwrap(),
            Some(Action::FlagResolved(FlagDisplay::Set(flag)))
        );

        fx.clock.advance(TimeDelta::hours(1));
        assert_eq!(
            ctx.load(Domain::Flag).await.unwrap(),
            Some(Action::FlagResolved(FlagDisplay::NotSet))
        );
    }

    #[tokio::test]
    async fn center_domains_are_skipped_for_system_scope() {
        let fx = Fixture::new();
        let ctx = fx.context(Scope::System);
        for domain in [Domain::Flag, Domain::Weather, Domain::Zones] {
            assert_eq!(ctx.load(domain).await.unwrap(), None);
        }
        assert_eq!(fx.memory.call_count(Endpoint::CurrentWeather).await, 0);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_value() {
        let fx = Fixture::new();
        fx.memory
            .seed_alert(fx.alert(Some(fx.center), AlertStatus::Active))
            .await;
        let ctx = fx.context(Scope::center(fx.center));
        let store = DashboardStore::new();

        refresh(&ctx, &store, Domain::Alerts).await;
        assert_eq!(store.snapshot().open_alerts, Some(1));

        fx.memory
            .fail(Endpoint::ListAlerts, DataAccessError::Transport("timeout".into()))
            .await;
        refresh(&ctx, &store, Domain::Alerts).await;
        assert_eq!(store.snapshot().open_alerts, Some(1));
    }
}

//! Realtime sync coordinator.
//!
//! Mounting a dashboard joins one scope on the realtime channel, loads an
//! initial snapshot and starts an event loop that:
//!
//! - routes each in-scope push event to the narrow refresh of every domain
//!   registered for it, discarding events from other scopes,
//! - re-runs the alert refresh on a fixed interval whatever the
//!   connectivity, so a missed event heals within one interval,
//! - mirrors the channel's connectivity signal into the store,
//! - arms a self-clearing notice when a new alert is raised.
//!
//! Unmounting deregisters the handlers, leaves the channel, stops the loop
//! and its timer, then tears the store down so in-flight refreshes have no
//! effect.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lifeguard_client::DataAccess;
use lifeguard_core::clock::Clock;
use lifeguard_types::{Alert, EventKind, PushEvent, Scope};
use tokio::sync::{RwLock, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::channel::{Membership, RealtimeChannel};
use crate::error::SyncError;
use crate::gateway::MutationGateway;
use crate::refresh::{Domain, RefreshContext, refresh, spawn_refresh};
use crate::settings::SyncSettings;
use crate::state::{Action, ConnectionState, DashboardState, DashboardStore};

// ---------------------------------------------------------------------------
// Handler sets
// ---------------------------------------------------------------------------

/// Which domains each event kind refreshes, plus the domains loaded on
/// mount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncHandlers {
    routes: BTreeMap<EventKind, BTreeSet<Domain>>,
    snapshot: BTreeSet<Domain>,
}

impl SyncHandlers {
    /// An empty handler set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh `domain` whenever a `kind` event arrives. The domain is
    /// also loaded on mount.
    #[must_use]
    pub fn on(mut self, kind: EventKind, domain: Domain) -> Self {
        self.routes.entry(kind).or_default().insert(domain);
        self.snapshot.insert(domain);
        self
    }

    /// Load `domain` on mount without tying it to any event.
    #[must_use]
    pub fn snapshot(mut self, domain: Domain) -> Self {
        self.snapshot.insert(domain);
        self
    }

    /// Lifeguard dashboard: alerts, flag, weather and the own roster.
    pub fn lifeguard() -> Self {
        Self::new()
            .on(EventKind::AlertRaised, Domain::Alerts)
            .on(EventKind::AlertStatusChanged, Domain::Alerts)
            .on(EventKind::FlagUpdated, Domain::Flag)
            .on(EventKind::WeatherUpdated, Domain::Weather)
            .snapshot(Domain::Shifts)
    }

    /// Center admin dashboard: the lifeguard set plus zones and staff.
    pub fn center_admin() -> Self {
        Self::lifeguard()
            .on(EventKind::ZoneUpdated, Domain::Zones)
            .snapshot(Domain::Lifeguards)
    }

    /// System admin dashboard: alerts across every center plus totals.
    pub fn system_admin() -> Self {
        Self::new()
            .on(EventKind::AlertRaised, Domain::Alerts)
            .on(EventKind::AlertStatusChanged, Domain::Alerts)
            .snapshot(Domain::Shifts)
            .snapshot(Domain::Lifeguards)
    }

    /// Domains registered for `kind`.
    pub fn domains_for(&self, kind: EventKind) -> impl Iterator<Item = Domain> + '_ {
        self.routes.get(&kind).into_iter().flatten().copied()
    }

    /// Whether any handler is registered for `kind`.
    pub fn handles(&self, kind: EventKind) -> bool {
        self.routes.get(&kind).is_some_and(|d| !d.is_empty())
    }

    /// Domains loaded on mount.
    pub fn snapshot_domains(&self) -> impl Iterator<Item = Domain> + '_ {
        self.snapshot.iter().copied()
    }
}

// ---------------------------------------------------------------------------
// Mount
// ---------------------------------------------------------------------------

/// Collaborators a dashboard mounts against.
pub struct SyncDeps {
    /// Data access collaborator.
    pub access: Arc<DataAccess>,
    /// Realtime channel.
    pub channel: Arc<RealtimeChannel>,
    /// Source of "now".
    pub clock: Arc<dyn Clock>,
    /// Timers and policies.
    pub settings: SyncSettings,
}

type Registry = Arc<RwLock<Option<SyncHandlers>>>;

/// Mount realtime sync for one dashboard on `scope`.
///
/// The returned handle is the disposer: call [`SyncHandle::unmount`] when
/// the view goes away.
///
/// # Errors
///
/// Returns [`SyncError::Channel`] if the scope cannot be joined.
pub async fn mount_realtime_sync(
    scope: Scope,
    handlers: SyncHandlers,
    deps: SyncDeps,
) -> Result<SyncHandle, SyncError> {
    let SyncDeps {
        access,
        channel,
        clock,
        settings,
    } = deps;

    let store = Arc::new(DashboardStore::new());
    store.dispatch(Action::ConnectionChanged(ConnectionState::Connecting));

    let subscription = match channel.join(scope).await {
        Ok(subscription) => subscription,
        Err(e) => {
            store.dispatch(Action::ConnectionChanged(ConnectionState::Disconnected));
            return Err(e);
        }
    };

    let mut connectivity = channel.connectivity();
    let up = *connectivity.borrow_and_update();
    store.dispatch(Action::ConnectionChanged(connection_state(up)));

    let poll_interval = settings.poll_interval;
    let notice_duration = settings.notice_duration;
    let ctx = Arc::new(RefreshContext {
        access,
        clock,
        scope,
        settings,
    });

    for domain in handlers.snapshot_domains() {
        spawn_refresh(&ctx, &store, domain);
    }

    let registry: Registry = Arc::new(RwLock::new(Some(handlers)));
    let (shutdown, shutdown_rx) = oneshot::channel();
    let worker = EventLoop {
        scope,
        ctx: Arc::clone(&ctx),
        store: Arc::clone(&store),
        registry: Arc::clone(&registry),
        notice_duration,
        notice_generation: AtomicU64::new(0),
    };
    let task = tokio::spawn(worker.run(
        subscription.events,
        connectivity,
        poll_interval,
        shutdown_rx,
    ));

    info!(scope = %scope, channel = channel.name(), "realtime sync mounted");
    Ok(SyncHandle {
        scope,
        channel,
        gateway: MutationGateway::new(Arc::clone(&ctx), Arc::clone(&store)),
        ctx,
        store,
        registry,
        membership: Some(subscription.membership),
        shutdown: Some(shutdown),
        task: Some(task),
    })
}

const fn connection_state(up: bool) -> ConnectionState {
    if up {
        ConnectionState::Connected
    } else {
        ConnectionState::Disconnected
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

struct EventLoop {
    scope: Scope,
    ctx: Arc<RefreshContext>,
    store: Arc<DashboardStore>,
    registry: Registry,
    notice_duration: Duration,
    notice_generation: AtomicU64,
}

impl EventLoop {
    async fn run(
        self,
        mut events: mpsc::Receiver<PushEvent>,
        mut connectivity: watch::Receiver<bool>,
        poll_interval: Duration,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut poll = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The mount snapshot already covers the immediate first tick.
        poll.reset();

        let mut events_open = true;
        let mut watching = true;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = events.recv(), if events_open => match event {
                    Some(event) => self.on_event(event).await,
                    None => {
                        debug!(scope = %self.scope, "event stream ended, polling only");
                        events_open = false;
                    }
                },
                _ = poll.tick() => {
                    debug!(scope = %self.scope, "fallback poll");
                    spawn_refresh(&self.ctx, &self.store, Domain::Alerts);
                }
                changed = connectivity.changed(), if watching => {
                    if changed.is_ok() {
                        let up = *connectivity.borrow_and_update();
                        info!(scope = %self.scope, connected = up, "connectivity changed");
                        self.store.dispatch(Action::ConnectionChanged(connection_state(up)));
                    } else {
                        self.store.dispatch(Action::ConnectionChanged(ConnectionState::Disconnected));
                        watching = false;
                    }
                }
            }
        }
        debug!(scope = %self.scope, "event loop stopped");
    }

    async fn on_event(&self, event: PushEvent) {
        let kind = event.kind();
        let event_scope = event.scope();
        if !self.scope.admits(&event_scope) {
            debug!(
                scope = %self.scope,
                event_scope = %event_scope,
                kind = kind.as_str(),
                "event outside scope discarded"
            );
            return;
        }

        let domains: Vec<Domain> = {
            let registry = self.registry.read().await;
            let Some(handlers) = registry.as_ref() else {
                debug!(kind = kind.as_str(), "handlers deregistered, event ignored");
                return;
            };
            handlers.domains_for(kind).collect()
        };
        if domains.is_empty() {
            debug!(kind = kind.as_str(), "no handler registered");
            return;
        }

        debug!(kind = kind.as_str(), ?domains, "push event");
        if let PushEvent::AlertRaised { alert } = event {
            self.arm_notice(alert);
        }
        for domain in domains {
            spawn_refresh(&self.ctx, &self.store, domain);
        }
    }

    fn arm_notice(&self, alert: Alert) {
        let generation = self
            .notice_generation
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1);
        self.store.dispatch(Action::NoticeArmed { alert, generation });

        let store = Arc::clone(&self.store);
        let duration = self.notice_duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            store.dispatch(Action::NoticeExpired { generation });
        });
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// A mounted dashboard.
///
/// Dropping the handle stops the loop and tears the store down without
/// waiting; [`unmount`](Self::unmount) does the same in order and waits.
pub struct SyncHandle {
    scope: Scope,
    channel: Arc<RealtimeChannel>,
    ctx: Arc<RefreshContext>,
    store: Arc<DashboardStore>,
    gateway: MutationGateway,
    registry: Registry,
    membership: Option<Membership>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// The mounted scope.
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.store.subscribe()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> DashboardState {
        self.store.snapshot()
    }

    /// Writes for this dashboard.
    pub const fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }

    /// Reload one domain now and wait for it.
    pub async fn refresh(&self, domain: Domain) {
        refresh(&self.ctx, &self.store, domain).await;
    }

    /// Tear the dashboard down.
    ///
    /// Handlers are deregistered first, then the scope is left, then the
    /// event loop and its poll timer stop, and finally the store stops
    /// accepting results from refreshes still in flight.
    pub async fn unmount(mut self) {
        self.registry.write().await.take();
        debug!(scope = %self.scope, "handlers deregistered");

        if let Some(membership) = self.membership.take() {
            membership.leave().await;
        }

        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(scope = %self.scope, error = %e, "event loop ended abnormally");
            }
        }

        self.store.tear_down();
        info!(scope = %self.scope, channel = self.channel.name(), "realtime sync unmounted");
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
            self.store.tear_down();
        }
    }
}

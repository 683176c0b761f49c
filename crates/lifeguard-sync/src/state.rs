//! Dashboard state container.
//!
//! A dashboard never owns mutable records. It holds derived display state
//! (counts, the resolved flag, the latest weather) that is replaced
//! wholesale by refresh results. Changes go through [`reduce`] and are
//! published on a `tokio::sync::watch` channel that views subscribe to.
//!
//! Each field starts as `None` ("not loaded yet") and is only ever
//! replaced by a successful load, so a failed refresh can never turn a
//! displayed count back into nothing.

use std::sync::atomic::{AtomicBool, Ordering};

use lifeguard_types::{Alert, SafetyFlag, Shift, ShiftStatus, WeatherSnapshot};
use tokio::sync::watch;
use tracing::debug;

/// Realtime transport status as seen by one dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected; the transport retries on its own.
    #[default]
    Disconnected,
    /// Joining the scope channel.
    Connecting,
    /// Receiving push events.
    Connected,
}

impl ConnectionState {
    /// The boolean connectivity indicator.
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// What the flag panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagDisplay {
    /// No flag in force; distinct from any colour.
    NotSet,
    /// The current flag.
    Set(SafetyFlag),
}

impl FlagDisplay {
    /// The flag in force, if any.
    pub const fn flag(&self) -> Option<&SafetyFlag> {
        match self {
            Self::NotSet => None,
            Self::Set(flag) => Some(flag),
        }
    }
}

/// Derived display state for one mounted dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// Realtime transport status.
    pub connection: ConnectionState,
    /// Open alerts in scope.
    pub open_alerts: Option<usize>,
    /// Shifts in scope (or the viewing lifeguard's roster).
    pub shifts: Option<Vec<Shift>>,
    /// Account-active lifeguards in scope.
    pub active_lifeguards: Option<usize>,
    /// Current safety flag.
    pub current_flag: Option<FlagDisplay>,
    /// Latest weather observation.
    pub weather: Option<WeatherSnapshot>,
    /// Supervised zones in scope.
    pub active_zones: Option<usize>,
    /// The alert behind the transient "new alert" notice.
    pub alert_notice: Option<Alert>,
    /// Generation of the notice currently shown.
    pub notice_generation: u64,
}

impl DashboardState {
    /// The boolean connectivity indicator.
    pub const fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Shifts currently on duty.
    pub fn active_shift_count(&self) -> Option<usize> {
        self.shifts.as_ref().map(|shifts| {
            shifts
                .iter()
                .filter(|s| s.status == ShiftStatus::Active)
                .count()
        })
    }
}

/// A state change.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The transport connected, disconnected or started joining.
    ConnectionChanged(ConnectionState),
    /// Open alert count reloaded.
    AlertsLoaded(usize),
    /// Shifts reloaded.
    ShiftsLoaded(Vec<Shift>),
    /// Active lifeguard count reloaded.
    LifeguardsLoaded(usize),
    /// Current flag re-resolved.
    FlagResolved(FlagDisplay),
    /// Weather reloaded.
    WeatherLoaded(WeatherSnapshot),
    /// Active zone count reloaded.
    ZonesLoaded(usize),
    /// Show the new-alert notice.
    NoticeArmed {
        /// The alert that was raised.
        alert: Alert,
        /// Generation the matching expiry must carry.
        generation: u64,
    },
    /// The notice display time for `generation` elapsed.
    NoticeExpired {
        /// Generation the timer was armed with.
        generation: u64,
    },
}

/// Apply `action` to `state`. Returns whether anything changed.
pub fn reduce(state: &mut DashboardState, action: Action) -> bool {
    match action {
        Action::ConnectionChanged(connection) => replace(&mut state.connection, connection),
        Action::AlertsLoaded(count) => replace(&mut state.open_alerts, Some(count)),
        Action::ShiftsLoaded(shifts) => replace(&mut state.shifts, Some(shifts)),
        Action::LifeguardsLoaded(count) => replace(&mut state.active_lifeguards, Some(count)),
        Action::FlagResolved(flag) => replace(&mut state.current_flag, Some(flag)),
        Action::WeatherLoaded(weather) => replace(&mut state.weather, Some(weather)),
        Action::ZonesLoaded(count) => replace(&mut state.active_zones, Some(count)),
        Action::NoticeArmed { alert, generation } => {
            state.alert_notice = Some(alert);
            state.notice_generation = generation;
            true
        }
        Action::NoticeExpired { generation } => {
            if state.notice_generation == generation && state.alert_notice.is_some() {
                state.alert_notice = None;
                true
            } else {
                false
            }
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// Owns a dashboard's state and publishes every change.
///
/// Once torn down the store ignores further actions, so refreshes that
/// complete after unmount have no effect.
#[derive(Debug)]
pub struct DashboardStore {
    state: watch::Sender<DashboardState>,
    torn_down: AtomicBool,
}

impl DashboardStore {
    /// Create a store with nothing loaded.
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(DashboardState::default()),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Apply an action. Returns `false` if the store was torn down.
    pub fn dispatch(&self, action: Action) -> bool {
        if self.is_torn_down() {
            debug!(?action, "store torn down, dropping action");
            return false;
        }
        self.state.send_if_modified(|state| reduce(state, action));
        true
    }

    /// Stop accepting actions.
    pub fn tear_down(&self) {
        self.torn_down.store(true, Ordering::Release);
    }

    /// Whether [`tear_down`](Self::tear_down) has been called.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}

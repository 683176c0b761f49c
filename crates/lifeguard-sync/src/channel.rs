//! Realtime channel abstraction.
//!
//! A channel offers three things: joining a scope (which yields a stream
//! of [`PushEvent`]s), leaving it again, and a connectivity signal. The
//! transport owns reconnection; the coordinator only watches the signal.
//!
//! Enum dispatch keeps the async methods usable without trait objects.

use std::sync::Arc;

use lifeguard_types::{PushEvent, Scope};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::nats::NatsChannel;

/// Buffered events per joined scope before the forwarder waits.
pub(crate) const EVENT_BUFFER: usize = 256;

/// Capacity of the in-process broadcast ring.
const LOCAL_CAPACITY: usize = 1024;

/// A realtime channel backend.
pub enum RealtimeChannel {
    /// NATS subjects.
    Nats(NatsChannel),
    /// In-process broadcast, for tests and single-process demos.
    Local(LocalChannel),
}

impl RealtimeChannel {
    /// Join `scope` and start receiving its events.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Channel`] if the subscription cannot be set up.
    pub async fn join(&self, scope: Scope) -> Result<ScopeSubscription, SyncError> {
        match self {
            Self::Nats(channel) => channel.join(scope).await,
            Self::Local(channel) => Ok(channel.join(scope)),
        }
    }

    /// Connectivity signal: `true` while the transport is connected.
    pub fn connectivity(&self) -> watch::Receiver<bool> {
        match self {
            Self::Nats(channel) => channel.connectivity(),
            Self::Local(channel) => channel.connectivity(),
        }
    }

    /// Human-readable backend name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Nats(_) => "nats",
            Self::Local(_) => "local",
        }
    }
}

impl From<NatsChannel> for RealtimeChannel {
    fn from(channel: NatsChannel) -> Self {
        Self::Nats(channel)
    }
}

impl From<LocalChannel> for RealtimeChannel {
    fn from(channel: LocalChannel) -> Self {
        Self::Local(channel)
    }
}

/// A joined scope: the event stream plus the membership that ends it.
pub struct ScopeSubscription {
    /// Events delivered for the scope.
    pub events: mpsc::Receiver<PushEvent>,
    /// Leaves the scope when consumed or dropped.
    pub membership: Membership,
}

/// Handle on a running scope forwarder.
///
/// Dropping it also stops the forwarder; [`leave`](Self::leave) additionally
/// waits for it to finish.
pub struct Membership {
    scope: Scope,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Membership {
    pub(crate) const fn new(scope: Scope, stop: oneshot::Sender<()>, task: JoinHandle<()>) -> Self {
        Self {
            scope,
            stop: Some(stop),
            task: Some(task),
        }
    }

    /// The joined scope.
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Leave the scope and wait for the forwarder to stop.
    pub async fn leave(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(scope = %self.scope, error = %e, "scope forwarder ended abnormally");
            }
        }
        info!(scope = %self.scope, "left scope");
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

// ---------------------------------------------------------------------------
// In-process channel
// ---------------------------------------------------------------------------

/// Room-less in-process channel.
///
/// Every joined scope receives every published event; scope filtering is
/// the subscriber's job. While marked disconnected, published events are
/// dropped the way a real transport would miss them.
#[derive(Debug, Clone)]
pub struct LocalChannel {
    events: broadcast::Sender<PushEvent>,
    connected: Arc<watch::Sender<bool>>,
}

impl LocalChannel {
    /// Create a connected channel.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(LOCAL_CAPACITY);
        Self {
            events,
            connected: Arc::new(watch::Sender::new(true)),
        }
    }

    /// Publish an event to every joined scope. Returns how many received it.
    pub fn publish(&self, event: PushEvent) -> usize {
        if !*self.connected.borrow() {
            debug!(kind = event.kind().as_str(), "channel disconnected, event lost");
            return 0;
        }
        self.events.send(event).unwrap_or(0)
    }

    /// Flip the connectivity signal.
    pub fn set_connected(&self, connected: bool) {
        self.connected.send_replace(connected);
    }

    /// Number of scopes currently joined.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn connectivity(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    fn join(&self, scope: Scope) -> ScopeSubscription {
        let mut rx = self.events.subscribe();
        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let (stop, mut stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    result = rx.recv() => match result {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(skipped, "local subscriber lagged, skipping ahead");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });

        info!(scope = %scope, "joined local scope");
        ScopeSubscription {
            events,
            membership: Membership::new(scope, stop, task),
        }
    }
}

impl Default for LocalChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lifeguard_types::{CenterId, FlagId};

    use super::*;

    fn flag_event(center_id: CenterId) -> PushEvent {
        PushEvent::FlagUpdated {
            center_id,
            flag_id: Some(FlagId::new()),
        }
    }

    #[tokio::test]
    async fn joined_scope_receives_published_events() {
        let local = LocalChannel::new();
        let channel = RealtimeChannel::from(local.clone());
        let center = CenterId::new();
        let mut sub = channel.join(Scope::center(center)).await.unwrap();

        assert_eq!(local.publish(flag_event(center)), 1);
        let event = sub.events.recv().await.unwrap();
        assert_eq!(event.scope(), Scope::center(center));
    }

    #[tokio::test]
    async fn leaving_drops_the_subscriber() {
        let local = LocalChannel::new();
        let channel = RealtimeChannel::from(local.clone());
        let sub = channel.join(Scope::System).await.unwrap();
        assert_eq!(local.subscriber_count(), 1);

        sub.membership.leave().await;
        assert_eq!(local.subscriber_count(), 0);
        assert_eq!(local.publish(flag_event(CenterId::new())), 0);
    }

    #[tokio::test]
    async fn disconnected_channel_loses_events() {
        let local = LocalChannel::new();
        let channel = RealtimeChannel::from(local.clone());
        let mut connectivity = channel.connectivity();
        let _sub = channel.join(Scope::System).await.unwrap();

        local.set_connected(false);
        connectivity.changed().await.unwrap();
        assert!(!*connectivity.borrow());
        assert_eq!(local.publish(flag_event(CenterId::new())), 0);
    }
}

//! NATS realtime channel.
//!
//! Push events are published as JSON on subjects of the form
//! `{prefix}.center.{center_id}.{event}` for center events and
//! `{prefix}.system.{event}` for events not tied to a center. A center
//! scope subscribes to its own center's subjects only; the system scope
//! subscribes to everything under the prefix.
//!
//! Reconnection is handled by `async-nats`. Its connect/disconnect
//! callbacks drive the connectivity signal.

use std::sync::Arc;

use futures::StreamExt;
use lifeguard_core::config::RealtimeConfig;
use lifeguard_types::{PushEvent, Scope};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::channel::{EVENT_BUFFER, Membership, ScopeSubscription};
use crate::error::SyncError;

/// NATS client wrapper for one dashboard process.
pub struct NatsChannel {
    client: async_nats::Client,
    prefix: String,
    connected: watch::Receiver<bool>,
}

impl NatsChannel {
    /// Connect to the server named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Channel`] if the connection cannot be established.
    pub async fn connect(config: &RealtimeConfig) -> Result<Self, SyncError> {
        let url = config.nats_url.as_str();
        info!(url, "connecting to NATS server");

        let (tx, connected) = watch::channel(false);
        let tx = Arc::new(tx);
        let events = Arc::clone(&tx);

        let client = async_nats::ConnectOptions::new()
            .event_callback(move |event| {
                let tx = Arc::clone(&events);
                async move {
                    match event {
                        async_nats::Event::Connected => {
                            info!("NATS connected");
                            tx.send_replace(true);
                        }
                        async_nats::Event::Disconnected => {
                            warn!("NATS disconnected, client will retry");
                            tx.send_replace(false);
                        }
                        other => debug!(event = %other, "NATS event"),
                    }
                }
            })
            .connect(url)
            .await
            .map_err(|e| SyncError::Channel(format!("failed to connect to {url}: {e}")))?;

        tx.send_replace(true);
        info!("NATS connection established");
        Ok(Self {
            client,
            prefix: config.subject_prefix.clone(),
            connected,
        })
    }

    /// Connectivity signal.
    pub fn connectivity(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    /// Subscribe to `scope` and forward decoded events.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Channel`] if the subscription fails.
    pub async fn join(&self, scope: Scope) -> Result<ScopeSubscription, SyncError> {
        let subject = scope_subject(&self.prefix, scope);
        debug!(subject = %subject, "subscribing to scope");
        let mut subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| SyncError::Channel(format!("failed to subscribe to {subject}: {e}")))?;

        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let (stop, mut stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stopped => {
                        if let Err(e) = subscriber.unsubscribe().await {
                            warn!(error = %e, "failed to unsubscribe");
                        }
                        break;
                    }
                    message = subscriber.next() => {
                        let Some(message) = message else {
                            debug!("subscription closed by server");
                            break;
                        };
                        match serde_json::from_slice::<PushEvent>(&message.payload) {
                            Ok(event) => {
                                if tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!(
                                subject = %message.subject,
                                error = %e,
                                "dropping undecodable push payload"
                            ),
                        }
                    }
                }
            }
        });

        info!(scope = %scope, subject = %subject, "joined NATS scope");
        Ok(ScopeSubscription {
            events,
            membership: Membership::new(scope, stop, task),
        })
    }

    /// Publish `event` on the subject for its scope.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Channel`] if serialization or publishing fails.
    pub async fn publish(&self, event: &PushEvent) -> Result<(), SyncError> {
        let subject = event_subject(&self.prefix, event);
        let payload = serde_json::to_vec(event)
            .map_err(|e| SyncError::Channel(format!("failed to serialize event: {e}")))?;
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| SyncError::Channel(format!("failed to publish to {subject}: {e}")))
    }
}

/// Subject an event is published on.
pub fn event_subject(prefix: &str, event: &PushEvent) -> String {
    let kind = event.kind().as_str();
    match event.scope() {
        Scope::Center { center_id } => format!("{prefix}.center.{center_id}.{kind}"),
        Scope::System => format!("{prefix}.system.{kind}"),
    }
}

/// Subject filter a scope subscribes to.
pub fn scope_subject(prefix: &str, scope: Scope) -> String {
    match scope {
        Scope::Center { center_id } => format!("{prefix}.center.{center_id}.*"),
        Scope::System => format!("{prefix}.>"),
    }
}

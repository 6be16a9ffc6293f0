//! Action channel: receives action-execution requests from the hub.
//!
//! The listener tracks every domain announced on the bus. When a session
//! connects it subscribes to all of them, and while connected it forwards
//! domains registered later. Each inbound frame is decoded in its own task;
//! `REQUEST_ACTION_EXECUTION` frames are republished on the bus for the
//! registry to dispatch.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;
use tokio::sync::mpsc;

use hublink_app::event_bus::{BusEvent, EventBus, Topic};
use hublink_domain::action::ActionEnvelope;
use hublink_domain::id::SubscriptionId;

use crate::error::WsError;
use crate::reconnect::SessionEnd;
use crate::transport::{self, WsMessage, WsWriter};
use crate::url::{ACTION_CHANNEL_PATH, to_websocket_url};

/// Connection settings of the action channel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActionChannelConfig {
    pub host: String,
    /// Value of the `X-Auth-Token` header.
    pub token: String,
}

#[derive(Default)]
struct Subscriptions {
    domains: BTreeSet<String>,
    live: Option<mpsc::UnboundedSender<String>>,
}

pub struct ActionListener {
    config: ActionChannelConfig,
    bus: Arc<EventBus>,
    subscriptions: Arc<Mutex<Subscriptions>>,
    subscription_id: SubscriptionId,
}

impl ActionListener {
    /// Create the listener and start tracking announced domains.
    #[must_use]
    pub fn new(config: ActionChannelConfig, bus: Arc<EventBus>) -> Self {
        let subscriptions = Arc::new(Mutex::new(Subscriptions::default()));
        let tracked = Arc::clone(&subscriptions);
        let subscription_id = bus.subscribe(Topic::DomainRegistered, move |event| {
            if let BusEvent::DomainRegistered { domain } = event {
                let mut state = tracked.lock().unwrap_or_else(PoisonError::into_inner);
                if state.domains.insert(domain.clone()) {
                    if let Some(live) = &state.live {
                        let _ = live.send(domain);
                    }
                }
            }
            async {}
        });

        Self {
            config,
            bus,
            subscriptions,
            subscription_id,
        }
    }

    #[must_use]
    pub fn url(&self) -> String {
        to_websocket_url(&self.config.host, ACTION_CHANNEL_PATH)
    }

    /// Domains announced so far, sorted.
    #[must_use]
    pub fn domains(&self) -> Vec<String> {
        self.lock().domains.iter().cloned().collect()
    }

    /// Connect, subscribe and read until the hub closes the socket.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] if the connection cannot be established or a read
    /// or write fails.
    #[tracing::instrument(skip_all, fields(url = %self.url()))]
    pub async fn run_session(&self) -> Result<SessionEnd, WsError> {
        let (mut writer, mut reader) =
            transport::connect(&self.url(), &[("X-Auth-Token", self.config.token.as_str())]).await?;
        tracing::info!("action channel connected");

        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        let known: Vec<String> = {
            let mut state = self.lock();
            state.live = Some(live_tx);
            state.domains.iter().cloned().collect()
        };

        let outcome: Result<SessionEnd, WsError> = async {
            for domain in &known {
                subscribe(&mut writer, domain).await?;
            }

            loop {
                tokio::select! {
                    Some(domain) = live_rx.recv() => subscribe(&mut writer, &domain).await?,
                    frame = reader.recv() => match frame {
                        None => return Ok(SessionEnd::Closed),
                        Some(Err(err)) => return Err(err),
                        Some(Ok(WsMessage::Text(text))) => self.accept(text),
                        Some(Ok(WsMessage::Ping(data))) => writer.send_pong(data).await?,
                        Some(Ok(WsMessage::Close { code, reason })) => {
                            tracing::info!(code, %reason, "action channel closed by hub");
                            return Ok(SessionEnd::Closed);
                        }
                        Some(Ok(_)) => {}
                    },
                }
            }
        }
        .await;

        self.lock().live = None;
        outcome
    }

    fn accept(&self, text: String) {
        let bus = Arc::clone(&self.bus);
        tokio::spawn(async move {
            let envelope: ActionEnvelope = match serde_json::from_str(&text) {
                Ok(envelope) => envelope,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed action frame");
                    return;
                }
            };
            if envelope.is_action_execution() {
                tracing::debug!(domain = %envelope.domain, "action execution requested");
                bus.publish(BusEvent::ActionExecutionRequested(envelope.data));
            } else {
                tracing::trace!(event_type = %envelope.event_type, "ignoring action frame");
            }
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Subscriptions> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ActionListener {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription_id);
    }
}

async fn subscribe(writer: &mut WsWriter, domain: &str) -> Result<(), WsError> {
    tracing::debug!(domain, "subscribing to domain");
    writer.send_json(&ActionEnvelope::subscribe(domain)).await
}

//! In-process publish/subscribe bus keyed by topic.
//!
//! Every callback subscribed to a topic is invoked in its own tokio task, so
//! a slow subscriber never delays the others and [`EventBus::publish`] never
//! blocks. There is no persistence and no ordering across topics.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use futures_util::future::BoxFuture;

use hublink_domain::id::SubscriptionId;

/// Topics carried by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A domain gained its first (or another) registered object.
    DomainRegistered,
    /// The hub asked for an action to be executed.
    ActionExecutionRequested,
}

/// Payload published on the bus; its variant determines its [`Topic`].
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    DomainRegistered { domain: String },
    /// Raw `data` of a `REQUEST_ACTION_EXECUTION` envelope.
    ActionExecutionRequested(serde_json::Value),
}

impl BusEvent {
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            Self::DomainRegistered { .. } => Topic::DomainRegistered,
            Self::ActionExecutionRequested(_) => Topic::ActionExecutionRequested,
        }
    }
}

type Callback = Arc<dyn Fn(BusEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Topic-keyed publish/subscribe bus.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<Topic, Vec<(SubscriptionId, Callback)>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for every event later published on `topic`.
    pub fn subscribe<F, Fut>(&self, topic: Topic, callback: F) -> SubscriptionId
    where
        F: Fn(BusEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = SubscriptionId::new();
        let boxed: Callback = Arc::new(move |event| -> BoxFuture<'static, ()> {
            Box::pin(callback(event))
        });
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic)
            .or_default()
            .push((id, boxed));
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;
        for list in subscribers.values_mut() {
            let before = list.len();
            list.retain(|(sub_id, _)| *sub_id != id);
            removed |= list.len() != before;
        }
        removed
    }

    /// Deliver `event` to every current subscriber of its topic.
    ///
    /// Must be called from within a tokio runtime; outside one the event is
    /// dropped with a warning.
    pub fn publish(&self, event: BusEvent) {
        let topic = event.topic();
        let callbacks: Vec<Callback> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();

        if callbacks.is_empty() {
            tracing::trace!(?topic, "no subscriber for published event");
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(?topic, "event published outside of a runtime, dropped");
            return;
        };

        for callback in callbacks {
            runtime.spawn(callback(event.clone()));
        }
    }

    /// Number of subscribers currently registered for `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .map_or(0, Vec::len)
    }
}

//! Plumbing shared by every object kind: hub access, driver callbacks and
//! payload decoding.

use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;

use hublink_app::ports::HubClient;
use hublink_domain::attribute::Attributes;
use hublink_domain::error::{HubLinkError, ValidationError};
use hublink_domain::event::Event;
use hublink_domain::event_type::EventType;
use hublink_domain::id::ObjectId;
use hublink_domain::object::{ObjectAction, ObjectMetadata};

/// Driver-supplied behaviour, invoked with a handle on the object and a
/// typed payload.
pub type Callback<P, R = ()> =
    Arc<dyn Fn(ObjectHandle, P) -> BoxFuture<'static, Result<R, HubLinkError>> + Send + Sync>;

/// Callback run once the object is registered with the hub.
pub type SetupCallback = Callback<()>;

/// Wrap an async closure into a [`Callback`].
pub fn callback<P, R, F, Fut>(f: F) -> Callback<P, R>
where
    F: Fn(ObjectHandle, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HubLinkError>> + Send + 'static,
{
    Arc::new(
        move |handle, payload| -> BoxFuture<'static, Result<R, HubLinkError>> {
            Box::pin(f(handle, payload))
        },
    )
}

/// What a callback gets to talk to the hub on behalf of its object.
#[derive(Clone)]
pub struct ObjectHandle {
    metadata: ObjectMetadata,
    hub: Arc<dyn HubClient>,
}

impl ObjectHandle {
    #[must_use]
    pub fn object_id(&self) -> &ObjectId {
        &self.metadata.object_id
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.metadata.domain
    }

    #[must_use]
    pub fn metadata(&self) -> &ObjectMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn hub(&self) -> &Arc<dyn HubClient> {
        &self.hub
    }

    /// # Errors
    ///
    /// Propagates the hub client's error.
    pub async fn set_state(&self, state: &str) -> Result<(), HubLinkError> {
        self.hub.set_state(self.object_id(), state).await
    }

    /// # Errors
    ///
    /// Propagates the hub client's error.
    pub async fn update_state_attributes(&self, attributes: Attributes) -> Result<(), HubLinkError> {
        self.hub
            .update_state_attributes(self.object_id(), &attributes)
            .await
    }

    /// Publish `<domain>.<event_key>`, related to this object when the event
    /// names no object. Returns the hub's answer.
    ///
    /// # Errors
    ///
    /// Propagates the hub client's error.
    pub async fn dispatch_event(&self, event_key: &str, mut event: Event) -> Result<String, HubLinkError> {
        if event.object_ids.is_empty() {
            event.object_ids.push(self.object_id().clone());
        }
        self.hub.dispatch_event(self.domain(), event_key, event).await
    }
}

/// Per-object state: metadata, the hub client handed over at setup, and
/// event types declared before setup.
pub struct ObjectContext {
    metadata: ObjectMetadata,
    hub: OnceLock<Arc<dyn HubClient>>,
    pending_event_types: Mutex<Vec<EventType>>,
}

impl ObjectContext {
    #[must_use]
    pub fn new(metadata: ObjectMetadata) -> Self {
        Self {
            metadata,
            hub: OnceLock::new(),
            pending_event_types: Mutex::new(Vec::new()),
        }
    }

    /// Metadata with the object type of the owning kind.
    #[must_use]
    pub fn metadata(&self, object_type: &str) -> ObjectMetadata {
        self.metadata.with_type(object_type)
    }

    #[must_use]
    pub fn object_id(&self) -> &ObjectId {
        &self.metadata.object_id
    }

    #[must_use]
    pub fn actions(&self, names: &[&str]) -> Vec<ObjectAction> {
        self.metadata.actions(names)
    }

    /// Keep the hub client. Later calls are ignored.
    pub fn attach(&self, hub: Arc<dyn HubClient>) {
        if self.hub.set(hub).is_err() {
            tracing::debug!(object_id = %self.metadata.object_id, "hub client already attached");
        }
    }

    /// # Errors
    ///
    /// Returns [`HubLinkError::NotSetUp`] before the registry ran `setup`.
    pub fn handle(&self) -> Result<ObjectHandle, HubLinkError> {
        let hub = self
            .hub
            .get()
            .ok_or_else(|| HubLinkError::NotSetUp(self.metadata.object_id.to_string()))?;
        Ok(ObjectHandle {
            metadata: self.metadata.clone(),
            hub: Arc::clone(hub),
        })
    }

    pub async fn set_state(&self, state: &str) -> Result<(), HubLinkError> {
        self.handle()?.set_state(state).await
    }

    pub async fn update_state_attributes(&self, attributes: Attributes) -> Result<(), HubLinkError> {
        self.handle()?.update_state_attributes(attributes).await
    }

    /// Declare event types owned by this object's domain. Before setup they
    /// are kept and sent by [`flush_event_types`](Self::flush_event_types).
    ///
    /// # Errors
    ///
    /// Propagates the hub client's error.
    pub async fn add_event_types(&self, event_types: Vec<EventType>) -> Result<(), HubLinkError> {
        let bound: Vec<EventType> = event_types
            .into_iter()
            .map(|event_type| event_type.owned_by(&self.metadata.domain))
            .collect();
        match self.hub.get() {
            Some(hub) => hub.add_event_types(&bound).await,
            None => {
                self.pending().extend(bound);
                Ok(())
            }
        }
    }

    /// Send event types declared before setup.
    ///
    /// # Errors
    ///
    /// Propagates the hub client's error.
    pub async fn flush_event_types(&self) -> Result<(), HubLinkError> {
        let pending = std::mem::take(&mut *self.pending());
        if pending.is_empty() {
            return Ok(());
        }
        self.handle()?.hub().add_event_types(&pending).await
    }

    /// Run the driver's setup callback, if any.
    ///
    /// # Errors
    ///
    /// Propagates the callback's error.
    pub async fn run_setup(&self, setup: Option<&SetupCallback>) -> Result<(), HubLinkError> {
        match setup {
            Some(setup) => setup(self.handle()?, ()).await,
            None => Ok(()),
        }
    }

    /// Run the driver callback bound to `action`.
    ///
    /// # Errors
    ///
    /// Fails when no callback was supplied for `action`, or with the
    /// callback's error.
    pub async fn invoke<P, R>(
        &self,
        action: &str,
        callback: Option<&Callback<P, R>>,
        payload: P,
    ) -> Result<R, HubLinkError> {
        let callback = callback
            .ok_or_else(|| HubLinkError::handler(format!("no handler registered for {action}")))?;
        callback(self.handle()?, payload).await
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, Vec<EventType>> {
        self.pending_event_types
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decode an action payload; a missing payload decodes as `{}`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPayload`] when the payload does not fit `T`.
pub fn decode_payload<T: DeserializeOwned>(
    action: &str,
    payload: &serde_json::Value,
) -> Result<T, HubLinkError> {
    let payload = if payload.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        payload.clone()
    };
    serde_json::from_value(payload).map_err(|err| {
        ValidationError::InvalidPayload {
            action: action.to_string(),
            reason: err.to_string(),
        }
        .into()
    })
}

#[must_use]
pub fn unsupported(action: &str) -> HubLinkError {
    ValidationError::UnsupportedAction(action.to_string()).into()
}

/// Implement `RegistrableObject` for an object kind.
///
/// The kind provides a `context: ObjectContext` field, `STATES` and
/// `ACTIONS` constants, and the inherent async methods `prepare` (after the
/// hub client is attached) and `run` (per action execution).
macro_rules! registrable_object {
    ($object:ident, $object_type:expr) => {
        #[async_trait::async_trait]
        impl hublink_app::ports::RegistrableObject for $object {
            fn metadata(&self) -> hublink_domain::object::ObjectMetadata {
                self.context.metadata($object_type)
            }

            fn available_states(&self) -> Vec<String> {
                Self::STATES.iter().map(|state| (*state).to_string()).collect()
            }

            fn available_actions(&self) -> Vec<hublink_domain::object::ObjectAction> {
                self.context.actions(Self::ACTIONS)
            }

            async fn setup(
                &self,
                hub: std::sync::Arc<dyn hublink_app::ports::HubClient>,
            ) -> Result<(), hublink_domain::error::HubLinkError> {
                self.context.attach(hub);
                self.prepare().await
            }

            async fn run_action(
                &self,
                execution_id: &hublink_domain::id::ExecutionId,
                action: &str,
                payload: &serde_json::Value,
            ) -> Result<hublink_domain::attribute::Attributes, hublink_domain::error::HubLinkError> {
                self.run(execution_id, action, payload).await
            }

            async fn set_state(&self, state: &str) -> Result<(), hublink_domain::error::HubLinkError> {
                self.context.set_state(state).await
            }

            async fn update_state_attributes(
                &self,
                attributes: hublink_domain::attribute::Attributes,
            ) -> Result<(), hublink_domain::error::HubLinkError> {
                self.context.update_state_attributes(attributes).await
            }
        }
    };
}

pub(crate) use registrable_object;

#[cfg(test)]
mod tests {
    use super::*;
    use hublink_app::testing::{HubCall, RecordingHubClient};

    fn context() -> ObjectContext {
        ObjectContext::new(
            ObjectMetadata::builder()
                .object_id("pir-1")
                .domain("sensor")
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn should_refuse_hub_calls_before_setup() {
        let result = context().set_state("on").await;
        assert!(matches!(result, Err(HubLinkError::NotSetUp(id)) if id == "pir-1"));
    }

    #[tokio::test]
    async fn should_keep_event_types_until_flushed() {
        let context = context();
        context
            .add_event_types(vec![EventType::new("motion", "Motion")])
            .await
            .unwrap();

        let hub = Arc::new(RecordingHubClient::new());
        context.attach(hub.clone());
        assert!(hub.calls().is_empty());

        context.flush_event_types().await.unwrap();
        context.flush_event_types().await.unwrap();

        let calls = hub.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            HubCall::AddEventTypes(types) => {
                assert_eq!(types[0].domain, "sensor");
                assert_eq!(types[0].origin, "driver");
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_relate_event_to_own_object_by_default() {
        let context = context();
        let hub = Arc::new(RecordingHubClient::new());
        context.attach(hub.clone());

        context
            .handle()
            .unwrap()
            .dispatch_event("motion", Event::default())
            .await
            .unwrap();

        match &hub.calls()[0] {
            HubCall::DispatchEvent(request) => {
                assert_eq!(request.event_type, "sensor.motion");
                assert_eq!(request.rels, vec!["/objects/pir-1"]);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_report_missing_callback() {
        let context = context();
        context.attach(Arc::new(RecordingHubClient::new()));

        let result = context.invoke::<(), ()>("sensor.action.calibrate", None, ()).await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "no handler registered for sensor.action.calibrate");
    }

    #[test]
    fn should_decode_missing_payload_as_empty_object() {
        #[derive(serde::Deserialize, Default)]
        #[serde(default)]
        struct Empty {
            code: String,
        }
        let decoded: Empty = decode_payload("x", &serde_json::Value::Null).unwrap();
        assert!(decoded.code.is_empty());
    }

    #[test]
    fn should_reject_payload_of_wrong_shape() {
        let result: Result<Vec<String>, _> = decode_payload("x", &serde_json::json!({"a": 1}));
        assert!(matches!(
            result,
            Err(HubLinkError::Validation(ValidationError::InvalidPayload { .. }))
        ));
    }
}

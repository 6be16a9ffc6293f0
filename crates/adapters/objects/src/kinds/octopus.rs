//! Octopus: multi-relay controller. Each action targets one relay.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hublink_domain::attribute::{self, Attributes};
use hublink_domain::error::HubLinkError;
use hublink_domain::event_type::EventType;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{Callback, ObjectContext, SetupCallback, registrable_object, unsupported};

pub const ACTION_RELAY_ON: &str = "octopus.action.turn_on";
pub const ACTION_RELAY_OFF: &str = "octopus.action.turn_off";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayPayload {
    pub relay_id: String,
}

impl RelayPayload {
    /// Accepts `{"relay_id": ...}`, a bare string, or anything else as its
    /// JSON text.
    #[must_use]
    pub fn from_action_payload(payload: &Value) -> Self {
        let relay_id = match payload {
            Value::Null => String::new(),
            Value::String(relay_id) => relay_id.clone(),
            Value::Object(fields) => match fields.get("relay_id") {
                Some(Value::String(relay_id)) => relay_id.clone(),
                Some(other) => other.to_string(),
                None => payload.to_string(),
            },
            other => other.to_string(),
        };
        Self { relay_id }
    }
}

pub struct Octopus {
    context: ObjectContext,
    on_setup: Option<SetupCallback>,
    on_relay_on: Option<Callback<RelayPayload, Attributes>>,
    on_relay_off: Option<Callback<RelayPayload, Attributes>>,
}

impl Octopus {
    const STATES: &'static [&'static str] = &[];
    const ACTIONS: &'static [&'static str] = &[ACTION_RELAY_ON, ACTION_RELAY_OFF];

    #[must_use]
    pub fn new(metadata: ObjectMetadata) -> Self {
        Self {
            context: ObjectContext::new(metadata),
            on_setup: None,
            on_relay_on: None,
            on_relay_off: None,
        }
    }

    #[must_use]
    pub fn on_setup(mut self, callback: SetupCallback) -> Self {
        self.on_setup = Some(callback);
        self
    }

    #[must_use]
    pub fn on_relay_on(mut self, callback: Callback<RelayPayload, Attributes>) -> Self {
        self.on_relay_on = Some(callback);
        self
    }

    #[must_use]
    pub fn on_relay_off(mut self, callback: Callback<RelayPayload, Attributes>) -> Self {
        self.on_relay_off = Some(callback);
        self
    }

    /// Flag the controller as unreachable (`offline = "true"`) or back.
    ///
    /// # Errors
    ///
    /// Fails before setup or when the hub refuses the update.
    pub async fn set_offline(&self, offline: bool) -> Result<(), HubLinkError> {
        self.context
            .update_state_attributes(attribute::single("offline", offline.to_string()))
            .await
    }

    /// # Errors
    ///
    /// Propagates the hub client's error.
    pub async fn add_event_types(&self, event_types: Vec<EventType>) -> Result<(), HubLinkError> {
        self.context.add_event_types(event_types).await
    }

    async fn prepare(&self) -> Result<(), HubLinkError> {
        self.context.flush_event_types().await?;
        self.context.run_setup(self.on_setup.as_ref()).await
    }

    async fn run(
        &self,
        _execution_id: &ExecutionId,
        action: &str,
        payload: &Value,
    ) -> Result<Attributes, HubLinkError> {
        let callback = match action {
            ACTION_RELAY_ON => &self.on_relay_on,
            ACTION_RELAY_OFF => &self.on_relay_off,
            _ => return Err(unsupported(action)),
        };
        let relay = RelayPayload::from_action_payload(payload);
        self.context.invoke(action, callback.as_ref(), relay).await
    }
}

registrable_object!(Octopus, "octopus");

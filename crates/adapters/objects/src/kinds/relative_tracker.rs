//! Relative tracker: an object moving in a site-local coordinate frame.
//! Kinematics are published as `<quantity>_x|y|z` state attributes.

use serde_json::Value;

use hublink_domain::attribute::Attributes;
use hublink_domain::error::HubLinkError;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{ObjectContext, SetupCallback, registrable_object, unsupported};

pub const STATE_MOVING: &str = "relative_tracker.state.moving";
pub const STATE_NO_SIGNAL: &str = "relative_tracker.state.no_signal";

pub struct RelativeTracker {
    context: ObjectContext,
    on_setup: Option<SetupCallback>,
}

impl RelativeTracker {
    const STATES: &'static [&'static str] = &[STATE_MOVING, STATE_NO_SIGNAL];
    const ACTIONS: &'static [&'static str] = &[];

    #[must_use]
    pub fn new(metadata: ObjectMetadata) -> Self {
        Self {
            context: ObjectContext::new(metadata),
            on_setup: None,
        }
    }

    #[must_use]
    pub fn on_setup(mut self, callback: SetupCallback) -> Self {
        self.on_setup = Some(callback);
        self
    }

    pub async fn set_moving(&self) -> Result<(), HubLinkError> {
        self.context.set_state(STATE_MOVING).await
    }

    pub async fn set_no_signal(&self) -> Result<(), HubLinkError> {
        self.context.set_state(STATE_NO_SIGNAL).await
    }

    pub async fn set_coords(&self, x: f64, y: f64, z: f64) -> Result<(), HubLinkError> {
        self.publish("position", x, y, z).await
    }

    pub async fn set_velocity(&self, x: f64, y: f64, z: f64) -> Result<(), HubLinkError> {
        self.publish("velocity", x, y, z).await
    }

    pub async fn set_acceleration(&self, x: f64, y: f64, z: f64) -> Result<(), HubLinkError> {
        self.publish("acceleration", x, y, z).await
    }

    pub async fn set_size(&self, x: f64, y: f64, z: f64) -> Result<(), HubLinkError> {
        self.publish("size", x, y, z).await
    }

    async fn publish(&self, quantity: &str, x: f64, y: f64, z: f64) -> Result<(), HubLinkError> {
        let attributes: Attributes = [("x", x), ("y", y), ("z", z)]
            .into_iter()
            .map(|(axis, value)| (format!("{quantity}_{axis}"), value.into()))
            .collect();
        self.context.update_state_attributes(attributes).await
    }

    async fn prepare(&self) -> Result<(), HubLinkError> {
        self.context.run_setup(self.on_setup.as_ref()).await
    }

    #[allow(clippy::unused_async)]
    async fn run(
        &self,
        _execution_id: &ExecutionId,
        action: &str,
        _payload: &Value,
    ) -> Result<Attributes, HubLinkError> {
        Err(unsupported(action))
    }
}

registrable_object!(RelativeTracker, "relative_tracker");

//! Sensor: read-only measurement with no actions.
//!
//! The reading is published as the `value` state attribute; counters use the
//! hub's increment and decrement endpoints.

use serde_json::Value;

use hublink_domain::attribute::{self, Attributes};
use hublink_domain::error::HubLinkError;
use hublink_domain::event_type::EventType;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{ObjectContext, SetupCallback, registrable_object, unsupported};

pub const STATE_MEASUREMENT: &str = "sensor.state.measurement";
pub const STATE_TOTAL: &str = "sensor.state.total";
pub const STATE_TOTAL_INCREASING: &str = "sensor.state.total_increasing";

/// How the hub should render the reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SensorType {
    #[default]
    Number,
    Text,
    Binary,
    Battery,
}

impl SensorType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "",
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Battery => "battery",
        }
    }
}

pub struct Sensor {
    context: ObjectContext,
    on_setup: Option<SetupCallback>,
}

impl Sensor {
    const STATES: &'static [&'static str] = &[STATE_MEASUREMENT, STATE_TOTAL, STATE_TOTAL_INCREASING];
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

    pub async fn set_value(&self, value: impl Into<String>) -> Result<(), HubLinkError> {
        self.context
            .update_state_attributes(attribute::single("value", value.into()))
            .await
    }

    pub async fn set_sensor_type(&self, sensor_type: SensorType) -> Result<(), HubLinkError> {
        self.context
            .update_state_attributes(attribute::single("sensor_type", sensor_type.as_str()))
            .await
    }

    pub async fn set_unit_of_measurement(&self, unit: impl Into<String>) -> Result<(), HubLinkError> {
        self.context
            .update_state_attributes(attribute::single("unit_of_measurement", unit.into()))
            .await
    }

    pub async fn increment(&self) -> Result<(), HubLinkError> {
        let handle = self.context.handle()?;
        handle.hub().increment(handle.object_id()).await
    }

    pub async fn decrement(&self) -> Result<(), HubLinkError> {
        let handle = self.context.handle()?;
        handle.hub().decrement(handle.object_id()).await
    }

    /// Declare event types raised by this sensor. Types declared before
    /// registration are sent during setup.
    ///
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

registrable_object!(Sensor, "sensor");

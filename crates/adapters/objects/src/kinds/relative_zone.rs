//! Relative zone: a polygon in the site-local frame that trackers enter
//! and leave. The shape is published once, at setup.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hublink_domain::attribute::{AttributeValue, Attributes};
use hublink_domain::error::{HubLinkError, ValidationError};
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{ObjectContext, SetupCallback, registrable_object, unsupported};

pub const STATE_ACTIVE: &str = "active";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ZoneShape {
    pub vertices: Vec<Vertex>,
}

pub struct RelativeZone {
    context: ObjectContext,
    shape: ZoneShape,
    on_setup: Option<SetupCallback>,
}

impl RelativeZone {
    const STATES: &'static [&'static str] = &[];
    const ACTIONS: &'static [&'static str] = &[];

    #[must_use]
    pub fn new(metadata: ObjectMetadata, shape: ZoneShape) -> Self {
        Self {
            context: ObjectContext::new(metadata),
            shape,
            on_setup: None,
        }
    }

    #[must_use]
    pub fn on_setup(mut self, callback: SetupCallback) -> Self {
        self.on_setup = Some(callback);
        self
    }

    #[must_use]
    pub fn shape(&self) -> &ZoneShape {
        &self.shape
    }

    async fn prepare(&self) -> Result<(), HubLinkError> {
        let shape = serde_json::to_string(&self.shape)
            .map_err(|err| ValidationError::Other(format!("unserializable zone shape: {err}")))?;
        let attributes = Attributes::from([
            ("shape".to_string(), AttributeValue::String(shape)),
            ("state".to_string(), AttributeValue::from(STATE_ACTIVE)),
        ]);
        self.context.update_state_attributes(attributes).await?;
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

registrable_object!(RelativeZone, "relative_zone");

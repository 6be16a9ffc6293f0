//! Video engine: the recording / analytics backend behind video channels.
//! It only reports health; it has no actions.

use serde_json::Value;

use hublink_domain::attribute::Attributes;
use hublink_domain::error::HubLinkError;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{ObjectContext, SetupCallback, registrable_object, unsupported};

pub const STATE_ONLINE: &str = "online";
pub const STATE_OFFLINE: &str = "offline";
pub const STATE_ERROR: &str = "error";

pub struct VideoEngine {
    context: ObjectContext,
    on_setup: Option<SetupCallback>,
}

impl VideoEngine {
    const STATES: &'static [&'static str] = &[STATE_ONLINE, STATE_OFFLINE, STATE_ERROR];
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

registrable_object!(VideoEngine, "video_engine");

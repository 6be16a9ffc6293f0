//! Person: an identity known to the driver (e.g. the holder of reader
//! credentials). No states, no actions.

use serde_json::Value;

use hublink_domain::attribute::Attributes;
use hublink_domain::error::HubLinkError;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{ObjectContext, SetupCallback, registrable_object};

pub struct Person {
    context: ObjectContext,
    on_setup: Option<SetupCallback>,
}

impl Person {
    const STATES: &'static [&'static str] = &[];
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

    /// Persons accept any addressed action and report nothing.
    #[allow(clippy::unused_async)]
    async fn run(
        &self,
        _execution_id: &ExecutionId,
        action: &str,
        _payload: &Value,
    ) -> Result<Attributes, HubLinkError> {
        tracing::debug!(object_id = %self.context.object_id(), action, "ignoring action on person");
        Ok(Attributes::new())
    }
}

registrable_object!(Person, "person");

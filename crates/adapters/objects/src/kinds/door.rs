//! Door: after a successful `open` / `close` callback the door reports the
//! matching state itself.

use serde_json::Value;

use hublink_domain::attribute::Attributes;
use hublink_domain::error::HubLinkError;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{Callback, ObjectContext, SetupCallback, registrable_object, unsupported};

pub const STATE_OPEN: &str = "door.state.open";
pub const STATE_CLOSE: &str = "door.state.close";
pub const STATE_LOCK: &str = "door.state.lock";
pub const STATE_OPENING: &str = "door.state.opening";
pub const STATE_CLOSING: &str = "door.state.closing";
pub const STATE_UNKNOWN: &str = "door.state.unknown";

pub const ACTION_OPEN: &str = "door.action.open";
pub const ACTION_CLOSE: &str = "door.action.close";

pub struct Door {
    context: ObjectContext,
    on_setup: Option<SetupCallback>,
    on_open: Option<Callback<()>>,
    on_close: Option<Callback<()>>,
}

impl Door {
    const STATES: &'static [&'static str] = &[
        STATE_OPEN,
        STATE_CLOSE,
        STATE_LOCK,
        STATE_OPENING,
        STATE_CLOSING,
        STATE_UNKNOWN,
    ];
    const ACTIONS: &'static [&'static str] = &[ACTION_OPEN, ACTION_CLOSE];

    #[must_use]
    pub fn new(metadata: ObjectMetadata) -> Self {
        Self {
            context: ObjectContext::new(metadata),
            on_setup: None,
            on_open: None,
            on_close: None,
        }
    }

    #[must_use]
    pub fn on_setup(mut self, callback: SetupCallback) -> Self {
        self.on_setup = Some(callback);
        self
    }

    #[must_use]
    pub fn on_open(mut self, callback: Callback<()>) -> Self {
        self.on_open = Some(callback);
        self
    }

    #[must_use]
    pub fn on_close(mut self, callback: Callback<()>) -> Self {
        self.on_close = Some(callback);
        self
    }

    async fn prepare(&self) -> Result<(), HubLinkError> {
        self.context.run_setup(self.on_setup.as_ref()).await
    }

    async fn run(
        &self,
        _execution_id: &ExecutionId,
        action: &str,
        _payload: &Value,
    ) -> Result<Attributes, HubLinkError> {
        let (callback, reached) = match action {
            ACTION_OPEN => (&self.on_open, STATE_OPEN),
            ACTION_CLOSE => (&self.on_close, STATE_CLOSE),
            _ => return Err(unsupported(action)),
        };
        self.context.invoke(action, callback.as_ref(), ()).await?;
        self.context.set_state(reached).await?;
        Ok(Attributes::new())
    }
}

registrable_object!(Door, "door");

//! Reader: credential reader (badge, QR code) that can also store and
//! delete credentials for a person.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hublink_domain::attribute::Attributes;
use hublink_domain::error::HubLinkError;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{
    Callback, ObjectContext, SetupCallback, decode_payload, registrable_object, unsupported,
};

pub const STATE_READING: &str = "reader.state.reading";
pub const STATE_IDLE: &str = "reader.state.idle";
pub const STATE_UNKNOWN: &str = "reader.state.unknown";
pub const STATE_ERROR: &str = "reader.state.error";

pub const ACTION_READ: &str = "reader.action.read";
pub const ACTION_STOP: &str = "reader.action.stop";
pub const ACTION_RESET: &str = "reader.action.reset";
pub const ACTION_RESTART: &str = "reader.action.restart";
pub const ACTION_STORE_QRS: &str = "reader.action.store_qrs";
pub const ACTION_DELETE_QRS: &str = "reader.action.delete_qrs";

/// Credentials to store or delete for one person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreQrsPayload {
    #[serde(rename = "personId")]
    pub person_id: String,
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Default)]
struct Callbacks {
    setup: Option<SetupCallback>,
    read: Option<Callback<()>>,
    stop: Option<Callback<()>>,
    reset: Option<Callback<()>>,
    restart: Option<Callback<()>>,
    store_qrs: Option<Callback<StoreQrsPayload>>,
    delete_qrs: Option<Callback<StoreQrsPayload>>,
}

pub struct Reader {
    context: ObjectContext,
    callbacks: Callbacks,
}

impl Reader {
    const STATES: &'static [&'static str] = &[STATE_UNKNOWN, STATE_IDLE, STATE_READING, STATE_ERROR];
    const ACTIONS: &'static [&'static str] = &[
        ACTION_READ,
        ACTION_STOP,
        ACTION_RESET,
        ACTION_RESTART,
        ACTION_STORE_QRS,
        ACTION_DELETE_QRS,
    ];

    #[must_use]
    pub fn new(metadata: ObjectMetadata) -> Self {
        Self {
            context: ObjectContext::new(metadata),
            callbacks: Callbacks::default(),
        }
    }

    #[must_use]
    pub fn on_setup(mut self, callback: SetupCallback) -> Self {
        self.callbacks.setup = Some(callback);
        self
    }

    #[must_use]
    pub fn on_read(mut self, callback: Callback<()>) -> Self {
        self.callbacks.read = Some(callback);
        self
    }

    #[must_use]
    pub fn on_stop(mut self, callback: Callback<()>) -> Self {
        self.callbacks.stop = Some(callback);
        self
    }

    #[must_use]
    pub fn on_reset(mut self, callback: Callback<()>) -> Self {
        self.callbacks.reset = Some(callback);
        self
    }

    #[must_use]
    pub fn on_restart(mut self, callback: Callback<()>) -> Self {
        self.callbacks.restart = Some(callback);
        self
    }

    #[must_use]
    pub fn on_store_qrs(mut self, callback: Callback<StoreQrsPayload>) -> Self {
        self.callbacks.store_qrs = Some(callback);
        self
    }

    #[must_use]
    pub fn on_delete_qrs(mut self, callback: Callback<StoreQrsPayload>) -> Self {
        self.callbacks.delete_qrs = Some(callback);
        self
    }

    async fn prepare(&self) -> Result<(), HubLinkError> {
        self.context.run_setup(self.callbacks.setup.as_ref()).await
    }

    async fn run(
        &self,
        _execution_id: &ExecutionId,
        action: &str,
        payload: &Value,
    ) -> Result<Attributes, HubLinkError> {
        let callbacks = &self.callbacks;
        match action {
            ACTION_STORE_QRS | ACTION_DELETE_QRS => {
                let credentials: StoreQrsPayload = decode_payload(action, payload)?;
                let callback = if action == ACTION_STORE_QRS {
                    &callbacks.store_qrs
                } else {
                    &callbacks.delete_qrs
                };
                self.context
                    .invoke(action, callback.as_ref(), credentials)
                    .await?;
            }
            _ => {
                let callback = match action {
                    ACTION_READ => &callbacks.read,
                    ACTION_STOP => &callbacks.stop,
                    ACTION_RESET => &callbacks.reset,
                    ACTION_RESTART => &callbacks.restart,
                    _ => return Err(unsupported(action)),
                };
                self.context.invoke(action, callback.as_ref(), ()).await?;
            }
        }
        Ok(Attributes::new())
    }
}

registrable_object!(Reader, "reader");

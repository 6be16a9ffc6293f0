//! Lock: `lock` / `unlock` actions whose callbacks return the attributes
//! reported as the execution result.

use serde_json::Value;

use hublink_domain::attribute::Attributes;
use hublink_domain::error::HubLinkError;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{Callback, ObjectContext, SetupCallback, registrable_object, unsupported};

pub const STATE_JAMMED: &str = "jammed";
pub const STATE_OPEN: &str = "open";
pub const STATE_OPENING: &str = "opening";
pub const STATE_LOCKED: &str = "locked";
pub const STATE_LOCKING: &str = "locking";
pub const STATE_UNLOCKED: &str = "unlocked";
pub const STATE_UNLOCKING: &str = "unlocking";
pub const STATE_UNKNOWN: &str = "unknown";

pub const ACTION_LOCK: &str = "lock";
pub const ACTION_UNLOCK: &str = "unlock";

pub struct Lock {
    context: ObjectContext,
    on_setup: Option<SetupCallback>,
    on_lock: Option<Callback<(), Attributes>>,
    on_unlock: Option<Callback<(), Attributes>>,
}

impl Lock {
    const STATES: &'static [&'static str] = &[
        STATE_JAMMED,
        STATE_OPEN,
        STATE_OPENING,
        STATE_LOCKED,
        STATE_LOCKING,
        STATE_UNLOCKED,
        STATE_UNLOCKING,
        STATE_UNKNOWN,
    ];
    const ACTIONS: &'static [&'static str] = &[ACTION_LOCK, ACTION_UNLOCK];

    #[must_use]
    pub fn new(metadata: ObjectMetadata) -> Self {
        Self {
            context: ObjectContext::new(metadata),
            on_setup: None,
            on_lock: None,
            on_unlock: None,
        }
    }

    #[must_use]
    pub fn on_setup(mut self, callback: SetupCallback) -> Self {
        self.on_setup = Some(callback);
        self
    }

    #[must_use]
    pub fn on_lock(mut self, callback: Callback<(), Attributes>) -> Self {
        self.on_lock = Some(callback);
        self
    }

    #[must_use]
    pub fn on_unlock(mut self, callback: Callback<(), Attributes>) -> Self {
        self.on_unlock = Some(callback);
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
        let callback = match action {
            ACTION_LOCK => &self.on_lock,
            ACTION_UNLOCK => &self.on_unlock,
            _ => return Err(unsupported(action)),
        };
        self.context.invoke(action, callback.as_ref(), ()).await
    }
}

registrable_object!(Lock, "lock");

#[cfg(test)]
mod tests {
    use hublink_app::ports::RegistrableObject;
    use hublink_domain::attribute::{self, AttributeValue};

    use super::*;
    use crate::context::callback;
    use crate::test_support::{metadata, set_up, states};

    fn lock() -> Lock {
        Lock::new(metadata("front-door-lock", "lock"))
            .on_lock(callback(|handle, ()| async move {
                handle.set_state(STATE_LOCKED).await?;
                Ok(attribute::single("latch", "engaged"))
            }))
            .on_unlock(callback(|_, ()| async { Err(HubLinkError::handler("motor stalled")) }))
    }

    #[test]
    fn should_list_eight_states() {
        let lock = lock();
        assert_eq!(lock.available_states().len(), 8);
        assert_eq!(lock.metadata().object_type, "lock");
    }

    #[tokio::test]
    async fn should_return_callback_attributes() {
        let lock = lock();
        let hub = set_up(&lock).await;

        let result = lock
            .run_action(&ExecutionId::from("e1"), ACTION_LOCK, &Value::Null)
            .await
            .unwrap();

        assert_eq!(result["latch"], AttributeValue::from("engaged"));
        assert_eq!(states(&hub), vec![STATE_LOCKED]);
    }

    #[tokio::test]
    async fn should_surface_callback_failure() {
        let lock = lock();
        set_up(&lock).await;

        let err = lock
            .run_action(&ExecutionId::from("e2"), ACTION_UNLOCK, &Value::Null)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "motor stalled");
    }
}

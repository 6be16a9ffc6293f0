//! Switch: two-state actuator driven by `turn_on` / `turn_off`.

use serde_json::Value;

use hublink_domain::attribute::Attributes;
use hublink_domain::error::HubLinkError;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{Callback, ObjectContext, SetupCallback, registrable_object, unsupported};

pub const STATE_OFF: &str = "switch.state.off";
pub const STATE_ON: &str = "switch.state.on";

pub const ACTION_TURN_ON: &str = "switch.action.turn_on";
pub const ACTION_TURN_OFF: &str = "switch.action.turn_off";

pub struct Switch {
    context: ObjectContext,
    on_setup: Option<SetupCallback>,
    on_turn_on: Option<Callback<()>>,
    on_turn_off: Option<Callback<()>>,
}

impl Switch {
    const STATES: &'static [&'static str] = &[STATE_OFF, STATE_ON];
    const ACTIONS: &'static [&'static str] = &[ACTION_TURN_ON, ACTION_TURN_OFF];

    #[must_use]
    pub fn new(metadata: ObjectMetadata) -> Self {
        Self {
            context: ObjectContext::new(metadata),
            on_setup: None,
            on_turn_on: None,
            on_turn_off: None,
        }
    }

    #[must_use]
    pub fn on_setup(mut self, callback: SetupCallback) -> Self {
        self.on_setup = Some(callback);
        self
    }

    #[must_use]
    pub fn on_turn_on(mut self, callback: Callback<()>) -> Self {
        self.on_turn_on = Some(callback);
        self
    }

    #[must_use]
    pub fn on_turn_off(mut self, callback: Callback<()>) -> Self {
        self.on_turn_off = Some(callback);
        self
    }

    /// Report the switch as on.
    ///
    /// # Errors
    ///
    /// Fails before setup or when the hub refuses the state.
    pub async fn turn_on(&self) -> Result<(), HubLinkError> {
        self.context.set_state(STATE_ON).await
    }

    /// Report the switch as off.
    ///
    /// # Errors
    ///
    /// Fails before setup or when the hub refuses the state.
    pub async fn turn_off(&self) -> Result<(), HubLinkError> {
        self.context.set_state(STATE_OFF).await
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
            ACTION_TURN_ON => &self.on_turn_on,
            ACTION_TURN_OFF => &self.on_turn_off,
            _ => return Err(unsupported(action)),
        };
        self.context.invoke(action, callback.as_ref(), ()).await?;
        Ok(Attributes::new())
    }
}

registrable_object!(Switch, "switch");

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hublink_app::ports::RegistrableObject;

    use super::*;
    use crate::context::callback;
    use crate::test_support::{metadata, set_up, states};

    #[test]
    fn should_describe_switch_vocabulary() {
        let switch = Switch::new(metadata("drv:1:relay", "switch"));
        let descriptor = switch.descriptor();

        assert_eq!(descriptor.metadata.object_type, "switch");
        assert_eq!(descriptor.available_states, vec![STATE_OFF, STATE_ON]);
        assert_eq!(descriptor.action_names(), vec![ACTION_TURN_ON, ACTION_TURN_OFF]);
        assert!(descriptor.available_actions.iter().all(|a| a.domain == "switch"));
    }

    #[tokio::test]
    async fn should_run_turn_on_callback_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let switch = Switch::new(metadata("drv:1:relay", "switch")).on_turn_on(callback(
            move |handle, ()| {
                let counted = Arc::clone(&counted);
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    handle.set_state(STATE_ON).await
                }
            },
        ));
        let hub = set_up(&switch).await;

        let result = switch
            .run_action(&ExecutionId::from("exec-1"), ACTION_TURN_ON, &Value::Null)
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(states(&hub), vec![STATE_ON]);
    }

    #[tokio::test]
    async fn should_fail_turn_off_without_callback() {
        let switch = Switch::new(metadata("drv:1:relay", "switch"));
        set_up(&switch).await;

        let err = switch
            .run_action(&ExecutionId::from("exec-2"), ACTION_TURN_OFF, &Value::Null)
            .await
            .unwrap_err();

        assert!(err.to_string().contains(ACTION_TURN_OFF));
    }

    #[tokio::test]
    async fn should_reject_foreign_action() {
        let switch = Switch::new(metadata("drv:1:relay", "switch"));
        set_up(&switch).await;

        let err = switch
            .run_action(&ExecutionId::from("exec-3"), "lock", &Value::Null)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "validation error");
    }

    #[tokio::test]
    async fn should_report_states_through_helpers() {
        let switch = Switch::new(metadata("drv:1:relay", "switch"));
        let hub = set_up(&switch).await;

        switch.turn_on().await.unwrap();
        switch.turn_off().await.unwrap();

        assert_eq!(states(&hub), vec![STATE_ON, STATE_OFF]);
    }
}

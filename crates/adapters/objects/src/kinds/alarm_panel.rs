//! Alarm panel: arm, disarm and bypass zones, optionally behind a code.
//!
//! The code policy is published at setup (`code_is_required`,
//! `code_is_numeric`) so the hub can show a keypad, and enforced here
//! before any callback runs. Successful arm / disarm commands move the panel
//! to the matching state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hublink_domain::attribute::{AttributeValue, Attributes};
use hublink_domain::error::{HubLinkError, ValidationError};
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{
    Callback, ObjectContext, SetupCallback, decode_payload, registrable_object, unsupported,
};

pub const STATE_ARMED: &str = "alarm_panel.state.armed";
pub const STATE_DISARMED: &str = "alarm_panel.state.disarmed";

pub const ACTION_ARM: &str = "alarm_panel.action.arm";
pub const ACTION_DISARM: &str = "alarm_panel.action.disarm";
pub const ACTION_BYPASS: &str = "alarm_panel.action.bypass";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmCommand {
    pub code: String,
    /// Only meaningful for bypass.
    pub zone: String,
}

/// How the panel expects its code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodePolicy {
    pub required: bool,
    pub numeric: bool,
}

impl CodePolicy {
    fn check(self, action: &str, code: &str) -> Result<(), HubLinkError> {
        let reason = if self.required && code.is_empty() {
            "a code is required"
        } else if self.numeric && !code.chars().all(|c| c.is_ascii_digit()) {
            "the code must be numeric"
        } else {
            return Ok(());
        };
        Err(ValidationError::InvalidPayload {
            action: action.to_string(),
            reason: reason.to_string(),
        }
        .into())
    }
}

pub struct AlarmPanel {
    context: ObjectContext,
    policy: CodePolicy,
    on_setup: Option<SetupCallback>,
    on_arm: Option<Callback<AlarmCommand>>,
    on_disarm: Option<Callback<AlarmCommand>>,
    on_bypass: Option<Callback<AlarmCommand>>,
}

impl AlarmPanel {
    const STATES: &'static [&'static str] = &[STATE_ARMED, STATE_DISARMED];
    const ACTIONS: &'static [&'static str] = &[ACTION_ARM, ACTION_DISARM, ACTION_BYPASS];

    #[must_use]
    pub fn new(metadata: ObjectMetadata, policy: CodePolicy) -> Self {
        Self {
            context: ObjectContext::new(metadata),
            policy,
            on_setup: None,
            on_arm: None,
            on_disarm: None,
            on_bypass: None,
        }
    }

    #[must_use]
    pub fn on_setup(mut self, callback: SetupCallback) -> Self {
        self.on_setup = Some(callback);
        self
    }

    #[must_use]
    pub fn on_arm(mut self, callback: Callback<AlarmCommand>) -> Self {
        self.on_arm = Some(callback);
        self
    }

    #[must_use]
    pub fn on_disarm(mut self, callback: Callback<AlarmCommand>) -> Self {
        self.on_disarm = Some(callback);
        self
    }

    #[must_use]
    pub fn on_bypass(mut self, callback: Callback<AlarmCommand>) -> Self {
        self.on_bypass = Some(callback);
        self
    }

    async fn prepare(&self) -> Result<(), HubLinkError> {
        let attributes = Attributes::from([
            ("code_is_required".to_string(), AttributeValue::Bool(self.policy.required)),
            ("code_is_numeric".to_string(), AttributeValue::Bool(self.policy.numeric)),
        ]);
        self.context.update_state_attributes(attributes).await?;
        self.context.run_setup(self.on_setup.as_ref()).await
    }

    async fn run(
        &self,
        _execution_id: &ExecutionId,
        action: &str,
        payload: &Value,
    ) -> Result<Attributes, HubLinkError> {
        let (callback, reached) = match action {
            ACTION_ARM => (&self.on_arm, Some(STATE_ARMED)),
            ACTION_DISARM => (&self.on_disarm, Some(STATE_DISARMED)),
            ACTION_BYPASS => (&self.on_bypass, None),
            _ => return Err(unsupported(action)),
        };
        let command: AlarmCommand = decode_payload(action, payload)?;
        self.policy.check(action, &command.code)?;

        self.context.invoke(action, callback.as_ref(), command).await?;
        if let Some(state) = reached {
            self.context.set_state(state).await?;
        }
        Ok(Attributes::new())
    }
}

registrable_object!(AlarmPanel, "alarm_panel");

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use hublink_app::ports::RegistrableObject;
    use serde_json::json;

    use super::*;
    use crate::context::callback;
    use crate::test_support::{attribute_updates, metadata, set_up, states};

    fn recording_panel(policy: CodePolicy) -> (AlarmPanel, Arc<Mutex<Vec<AlarmCommand>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = |seen: &Arc<Mutex<Vec<AlarmCommand>>>| {
            let seen = Arc::clone(seen);
            callback(move |_, command: AlarmCommand| {
                seen.lock().unwrap().push(command);
                async { Ok(()) }
            })
        };
        let panel = AlarmPanel::new(metadata("panel-1", "alarm_panel"), policy)
            .on_arm(record(&seen))
            .on_disarm(record(&seen))
            .on_bypass(record(&seen));
        (panel, seen)
    }

    #[tokio::test]
    async fn should_publish_code_policy_on_setup() {
        let (panel, _) = recording_panel(CodePolicy {
            required: true,
            numeric: true,
        });

        let hub = set_up(&panel).await;

        let updates = attribute_updates(&hub);
        assert_eq!(updates[0]["code_is_required"], AttributeValue::Bool(true));
        assert_eq!(updates[0]["code_is_numeric"], AttributeValue::Bool(true));
    }

    #[tokio::test]
    async fn should_arm_then_report_state() {
        let (panel, seen) = recording_panel(CodePolicy::default());
        let hub = set_up(&panel).await;

        panel
            .run_action(&ExecutionId::from("e1"), ACTION_ARM, &json!({"code": "1234"}))
            .await
            .unwrap();
        panel
            .run_action(&ExecutionId::from("e2"), ACTION_DISARM, &Value::Null)
            .await
            .unwrap();

        assert_eq!(states(&hub), vec![STATE_ARMED, STATE_DISARMED]);
        assert_eq!(seen.lock().unwrap()[0].code, "1234");
    }

    #[tokio::test]
    async fn should_bypass_zone_without_state_change() {
        let (panel, seen) = recording_panel(CodePolicy::default());
        let hub = set_up(&panel).await;

        panel
            .run_action(
                &ExecutionId::from("e3"),
                ACTION_BYPASS,
                &json!({"code": "0", "zone": "garage"}),
            )
            .await
            .unwrap();

        assert!(states(&hub).is_empty());
        assert_eq!(seen.lock().unwrap()[0].zone, "garage");
    }

    #[tokio::test]
    async fn should_refuse_missing_code_when_required() {
        let (panel, seen) = recording_panel(CodePolicy {
            required: true,
            numeric: false,
        });
        set_up(&panel).await;

        let err = panel
            .run_action(&ExecutionId::from("e4"), ACTION_ARM, &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            HubLinkError::Validation(ValidationError::InvalidPayload { ref reason, .. })
                if reason == "a code is required"
        ));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_refuse_non_numeric_code() {
        let (panel, _) = recording_panel(CodePolicy {
            required: false,
            numeric: true,
        });
        set_up(&panel).await;

        let result = panel
            .run_action(&ExecutionId::from("e5"), ACTION_DISARM, &json!({"code": "12a4"}))
            .await;

        assert!(result.is_err());
    }
}

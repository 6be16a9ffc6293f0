//! Notifier: delivers a notification (text and media links) to people.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hublink_domain::attribute::Attributes;
use hublink_domain::error::HubLinkError;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{
    Callback, ObjectContext, SetupCallback, decode_payload, registrable_object, unsupported,
};

pub const STATE_UNKNOWN: &str = "notifier.state.unknown";
pub const STATE_IDLE: &str = "notifier.state.idle";
pub const STATE_BUSY: &str = "notifier.state.busy";
pub const STATE_ERROR: &str = "notifier.state.error";

pub const ACTION_NOTIFY: &str = "notifier.action.notify";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPayload {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub audio_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub video_url: String,
}

pub struct Notifier {
    context: ObjectContext,
    on_setup: Option<SetupCallback>,
    on_notify: Option<Callback<NotificationPayload>>,
}

impl Notifier {
    const STATES: &'static [&'static str] = &[STATE_UNKNOWN, STATE_IDLE, STATE_BUSY, STATE_ERROR];
    const ACTIONS: &'static [&'static str] = &[ACTION_NOTIFY];

    #[must_use]
    pub fn new(metadata: ObjectMetadata) -> Self {
        Self {
            context: ObjectContext::new(metadata),
            on_setup: None,
            on_notify: None,
        }
    }

    #[must_use]
    pub fn on_setup(mut self, callback: SetupCallback) -> Self {
        self.on_setup = Some(callback);
        self
    }

    #[must_use]
    pub fn on_notify(mut self, callback: Callback<NotificationPayload>) -> Self {
        self.on_notify = Some(callback);
        self
    }

    async fn prepare(&self) -> Result<(), HubLinkError> {
        self.context.run_setup(self.on_setup.as_ref()).await
    }

    async fn run(
        &self,
        _execution_id: &ExecutionId,
        action: &str,
        payload: &Value,
    ) -> Result<Attributes, HubLinkError> {
        if action != ACTION_NOTIFY {
            return Err(unsupported(action));
        }
        let notification = decode_payload(action, payload)?;
        self.context
            .invoke(action, self.on_notify.as_ref(), notification)
            .await?;
        Ok(Attributes::new())
    }
}

registrable_object!(Notifier, "notifier");

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use hublink_app::ports::RegistrableObject;
    use serde_json::json;

    use super::*;
    use crate::context::callback;
    use crate::test_support::{metadata, set_up};

    #[tokio::test]
    async fn should_pass_notification_to_callback() {
        let received = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&received);
        let notifier = Notifier::new(metadata("siren-1", "notifier")).on_notify(callback(
            move |_, payload: NotificationPayload| {
                *sink.lock().unwrap() = Some(payload);
                async { Ok(()) }
            },
        ));
        set_up(&notifier).await;

        notifier
            .run_action(
                &ExecutionId::from("e1"),
                ACTION_NOTIFY,
                &json!({"title": "Intrusion", "image_url": "http://cam/1.jpg"}),
            )
            .await
            .unwrap();

        let payload = received.lock().unwrap().clone().unwrap();
        assert_eq!(payload.title, "Intrusion");
        assert_eq!(payload.image_url, "http://cam/1.jpg");
        assert!(payload.content.is_empty());
    }

    #[test]
    fn should_omit_empty_fields_when_serialized() {
        let payload = NotificationPayload {
            title: "Hi".to_string(),
            ..NotificationPayload::default()
        };
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({"title": "Hi"}));
    }

    #[tokio::test]
    async fn should_reject_unknown_action() {
        let notifier = Notifier::new(metadata("siren-1", "notifier"));
        set_up(&notifier).await;

        let result = notifier
            .run_action(&ExecutionId::from("e2"), "notifier.action.mute", &Value::Null)
            .await;

        assert!(result.is_err());
    }
}

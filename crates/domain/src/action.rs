//! Action-channel messages.

use serde::{Deserialize, Serialize};

use crate::id::{ExecutionId, ObjectId};

/// Envelope type of an inbound action-execution request.
pub const REQUEST_ACTION_EXECUTION: &str = "REQUEST_ACTION_EXECUTION";

/// Envelope type of an outbound domain subscription.
pub const REQUEST_SUBSCRIPTION_TO_DOMAIN: &str = "REQUEST_SUBSCRIPTION_TO_DOMAIN";

/// Frame exchanged on the action channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    pub event_type: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl ActionEnvelope {
    /// Subscription frame for `domain`.
    #[must_use]
    pub fn subscribe(domain: impl Into<String>) -> Self {
        Self {
            event_type: REQUEST_SUBSCRIPTION_TO_DOMAIN.to_string(),
            domain: domain.into(),
            data: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn is_action_execution(&self) -> bool {
        self.event_type == REQUEST_ACTION_EXECUTION
    }
}

/// A request from the hub to run an action.
///
/// An empty `object_id` list addresses every object of the domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionExecutionRequest {
    pub id: ExecutionId,
    #[serde(default)]
    pub domain: String,
    pub action: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub object_id: Vec<ObjectId>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ActionExecutionRequest {
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.object_id.is_empty()
    }

    /// Whether `object_id` is addressed by this request.
    #[must_use]
    pub fn targets(&self, object_id: &ObjectId) -> bool {
        self.is_broadcast() || self.object_id.iter().any(|id| id == object_id)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ObjectId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ObjectId>>::deserialize(deserializer)?.unwrap_or_default())
}

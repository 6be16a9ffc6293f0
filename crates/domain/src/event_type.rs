//! Event types: the catalogue of events a driver may raise.

use serde::{Deserialize, Serialize};

use crate::error::{HubLinkError, ValidationError};

/// Origin recorded for event types registered through an object.
pub const DRIVER_ORIGIN: &str = "driver";

/// An event type known to the hub.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventType {
    pub domain: String,
    pub event_type: String,
    pub display_name: String,
    pub display_description: String,
    pub event_level: String,
    pub color: String,
    pub show_color: bool,
    pub is_hidden: bool,
    pub origin: String,
}

impl EventType {
    #[must_use]
    pub fn new(event_type: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Copy of this event type bound to `domain` with the driver origin.
    #[must_use]
    pub fn owned_by(mut self, domain: &str) -> Self {
        self.domain = domain.to_string();
        self.origin = DRIVER_ORIGIN.to_string();
        self
    }

    /// Check that both routing keys are present.
    ///
    /// # Errors
    ///
    /// Returns [`HubLinkError::Validation`] when `domain` or `event_type` is empty.
    pub fn validate(&self) -> Result<(), HubLinkError> {
        if self.domain.is_empty() {
            return Err(ValidationError::EmptyDomain.into());
        }
        if self.event_type.is_empty() {
            return Err(ValidationError::EmptyEventType.into());
        }
        Ok(())
    }
}

/// Event type as echoed back by the hub.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventTypeRecord {
    #[serde(flatten)]
    pub event_type: EventType,
    pub created_at: String,
    pub updated_at: String,
}

/// Per-entry outcome of a batch event-type registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventTypesBatchResponse {
    pub successful: Vec<EventTypeRecord>,
    pub failed: Vec<EventTypeRecord>,
}

impl EventTypesBatchResponse {
    /// Whether no entry of the batch was created.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.successful.is_empty() && !self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_bind_event_type_to_object_domain() {
        let event = EventType::new("motion", "Motion").owned_by("sensor");
        assert_eq!(event.domain, "sensor");
        assert_eq!(event.origin, "driver");
        assert!(event.validate().is_ok());
    }

    #[test]
    fn should_reject_event_type_without_domain() {
        let result = EventType::new("motion", "Motion").validate();
        assert!(matches!(
            result,
            Err(HubLinkError::Validation(ValidationError::EmptyDomain))
        ));
    }

    #[test]
    fn should_reject_event_type_without_name() {
        let result = EventType::new("", "Motion").owned_by("sensor").validate();
        assert!(matches!(
            result,
            Err(HubLinkError::Validation(ValidationError::EmptyEventType))
        ));
    }

    #[test]
    fn should_decode_partial_batch_response() {
        let json = r#"{
            "successful": [{"domain": "sensor", "event_type": "a", "created_at": "now"}],
            "failed": [{"domain": "sensor", "event_type": "b"}]
        }"#;
        let response: EventTypesBatchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.successful[0].event_type.event_type, "a");
        assert_eq!(response.failed[0].event_type.event_type, "b");
        assert!(!response.all_failed());
    }

    #[test]
    fn should_report_all_failed_batch() {
        let json = r#"{"successful": [], "failed": [{"event_type": "b"}]}"#;
        let response: EventTypesBatchResponse = serde_json::from_str(json).unwrap();
        assert!(response.all_failed());
    }
}

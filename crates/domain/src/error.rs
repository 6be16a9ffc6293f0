//! Common error types used across the workspace.
//!
//! [`HubLinkError`] is the error that crosses port boundaries. Adapter crates
//! define their own typed errors and convert into it via `From`.

use std::time::Duration;

/// Error code the hub returns when an object or action already exists.
pub const ALREADY_EXISTS_CODES: [&str; 2] = ["ERR_ITEM_ALREADY_EXIST", "ERR_OBJECT_ALREADY_EXIST"];

/// Body fragment the hub returns when setting the state of a disabled object.
pub const OBJECT_DISABLED: &str = "object is disabled";

/// Body fragment the hub returns when an event type is registered twice.
pub const DUPLICATE_ENTRY: &str = "Duplicate entry";

/// Top-level error for hublink operations.
#[derive(Debug, thiserror::Error)]
pub enum HubLinkError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The hub answered with an error status.
    #[error("hub rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Network, socket or decoding failure below the port boundary.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An object was used before the registry handed it a hub client.
    #[error("object {0} has not been set up")]
    NotSetUp(String),

    /// Failure raised by driver-supplied code (action or config handler).
    #[error(transparent)]
    Handler(Box<dyn std::error::Error + Send + Sync>),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Every entry of a batch, or some entries of an all-or-nothing batch,
    /// were refused by the hub.
    #[error("batch rejected: {0}")]
    BatchFailed(String),

    /// The hub runs a version this driver cannot talk to.
    #[error("hub version {0:?} is not supported, 2.0.0 or later is required")]
    UnsupportedHubVersion(String),
}

impl HubLinkError {
    /// Wrap an error coming from driver-supplied code.
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(err.into())
    }

    /// Status of a [`Rejected`](Self::Rejected) error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found_status(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether the hub reported that the resource already exists.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.body_contains_any(&ALREADY_EXISTS_CODES)
    }

    /// Whether the hub refused a state change because the object is disabled.
    #[must_use]
    pub fn is_object_disabled(&self) -> bool {
        self.body_contains_any(&[OBJECT_DISABLED])
    }

    #[must_use]
    pub fn is_duplicate_entry(&self) -> bool {
        self.body_contains_any(&[DUPLICATE_ENTRY])
    }

    fn body_contains_any(&self, needles: &[&str]) -> bool {
        match self {
            Self::Rejected { body, .. } => needles.iter().any(|n| body.contains(n)),
            _ => false,
        }
    }
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("object id must not be empty")]
    EmptyObjectId,

    #[error("domain must not be empty")]
    EmptyDomain,

    #[error("event type must not be empty")]
    EmptyEventType,

    #[error("event types cannot be empty")]
    NoEventTypes,

    #[error("object {object_id} is already registered in domain {domain}")]
    DomainMismatch { object_id: String, domain: String },

    /// Another registration of the same id has not finished yet.
    #[error("object {0} is being registered")]
    RegistrationInProgress(String),

    #[error("invalid payload for {action}: {reason}")]
    InvalidPayload { action: String, reason: String },

    #[error("action {0} is not supported")]
    UnsupportedAction(String),

    #[error("{0}")]
    Other(String),
}

/// A lookup that found nothing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16, body: &str) -> HubLinkError {
        HubLinkError::Rejected {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn should_detect_already_exists_code_in_body() {
        assert!(rejected(409, r#"{"code":"ERR_ITEM_ALREADY_EXIST"}"#).is_already_exists());
        assert!(rejected(400, "ERR_OBJECT_ALREADY_EXIST").is_already_exists());
        assert!(!rejected(400, "boom").is_already_exists());
    }

    #[test]
    fn should_detect_disabled_object() {
        assert!(rejected(400, "object is disabled").is_object_disabled());
        assert!(!HubLinkError::Timeout(Duration::from_secs(1)).is_object_disabled());
    }

    #[test]
    fn should_detect_duplicate_entry() {
        assert!(rejected(500, "Error 1062: Duplicate entry 'x'").is_duplicate_entry());
    }

    #[test]
    fn should_report_not_found_status() {
        assert!(rejected(404, "").is_not_found_status());
        assert!(!rejected(400, "").is_not_found_status());
    }

    #[test]
    fn should_display_handler_error_transparently() {
        let err = HubLinkError::handler("relay unreachable");
        assert_eq!(err.to_string(), "relay unreachable");
    }

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "Object",
            id: "drv:1".to_string(),
        };
        assert_eq!(err.to_string(), "Object drv:1 not found");
    }
}

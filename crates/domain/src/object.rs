//! Objects: the typed things a driver exposes to the hub.
//!
//! An object belongs to a *domain* (e.g. `switch`, `sensor`) and is identified
//! by an [`ObjectId`] that is unique across the registry.

use serde::{Deserialize, Serialize};

use crate::error::{HubLinkError, ValidationError};
use crate::id::ObjectId;

/// Descriptive metadata of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub object_id: ObjectId,
    pub name: String,
    /// Overwritten by each object kind when read.
    #[serde(rename = "type")]
    pub object_type: String,
    pub domain: String,
    pub device_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i18n: Option<serde_json::Value>,
}

impl ObjectMetadata {
    #[must_use]
    pub fn builder() -> ObjectMetadataBuilder {
        ObjectMetadataBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubLinkError::Validation`] when `object_id` or `domain` is empty.
    pub fn validate(&self) -> Result<(), HubLinkError> {
        if self.object_id.is_empty() {
            return Err(ValidationError::EmptyObjectId.into());
        }
        if self.domain.is_empty() {
            return Err(ValidationError::EmptyDomain.into());
        }
        Ok(())
    }

    /// Copy of this metadata with the given object type.
    #[must_use]
    pub fn with_type(&self, object_type: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            ..self.clone()
        }
    }

    /// Numeric form of `device_id`, `0` when it is not a number.
    #[must_use]
    pub fn numeric_device_id(&self) -> i64 {
        self.device_id.trim().parse().unwrap_or(0)
    }

    /// One [`ObjectAction`] per action name, bound to this object's domain.
    #[must_use]
    pub fn actions(&self, names: &[&str]) -> Vec<ObjectAction> {
        names
            .iter()
            .map(|name| ObjectAction::new(*name, self.domain.clone()))
            .collect()
    }
}

/// Step-by-step builder for [`ObjectMetadata`].
#[derive(Debug, Default)]
pub struct ObjectMetadataBuilder {
    object_id: Option<ObjectId>,
    name: Option<String>,
    domain: Option<String>,
    device_id: Option<String>,
    tags: Vec<String>,
    i18n: Option<serde_json::Value>,
}

impl ObjectMetadataBuilder {
    #[must_use]
    pub fn object_id(mut self, object_id: impl Into<ObjectId>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn i18n(mut self, i18n: serde_json::Value) -> Self {
        self.i18n = Some(i18n);
        self
    }

    /// Consume the builder, validate, and return an [`ObjectMetadata`].
    ///
    /// # Errors
    ///
    /// Returns [`HubLinkError::Validation`] if `object_id` or `domain` is missing.
    pub fn build(self) -> Result<ObjectMetadata, HubLinkError> {
        let metadata = ObjectMetadata {
            object_id: self.object_id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            object_type: String::new(),
            domain: self.domain.unwrap_or_default(),
            device_id: self.device_id.unwrap_or_default(),
            tags: self.tags,
            i18n: self.i18n,
        };
        metadata.validate()?;
        Ok(metadata)
    }
}

/// An action an object accepts, registered with the hub per domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectAction {
    pub action: String,
    pub domain: String,
}

impl ObjectAction {
    #[must_use]
    pub fn new(action: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            domain: domain.into(),
        }
    }
}

/// Everything the hub needs to create an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDescriptor {
    pub metadata: ObjectMetadata,
    pub available_states: Vec<String>,
    pub available_actions: Vec<ObjectAction>,
}

impl ObjectDescriptor {
    /// Action names, in declaration order.
    #[must_use]
    pub fn action_names(&self) -> Vec<String> {
        self.available_actions
            .iter()
            .map(|a| a.action.clone())
            .collect()
    }
}

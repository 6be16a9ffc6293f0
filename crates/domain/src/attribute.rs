//! Typed attribute values attached to object states and action results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attribute bag sent as `state_additional_properties` or as an action result.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Build an [`Attributes`] map with a single entry.
#[must_use]
pub fn single(key: impl Into<String>, value: impl Into<AttributeValue>) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert(key.into(), value.into());
    attrs
}

/// The `{"error": message}` map reported for a failed action.
#[must_use]
pub fn error_result(message: impl Into<String>) -> Attributes {
    single("error", message.into())
}

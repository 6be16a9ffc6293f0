//! Object state records and state changes.

use serde::{Deserialize, Serialize};

use crate::attribute::Attributes;
use crate::id::ObjectId;
use crate::time::Timestamp;

/// A state value and its additional properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectState {
    pub state: String,
    pub state_additional_properties: Attributes,
}

/// One stored state of an object, as returned by the hub.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StateRecord {
    pub id: String,
    pub object_id: ObjectId,
    pub datetime: Option<Timestamp>,
    pub domain: String,
    pub state: ObjectState,
}

/// Pagination block of a state listing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PageMetadata {
    pub total_items: u64,
    pub limit: u64,
    pub offset: u64,
}

/// A page of state records, newest first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaginatedStateRecords {
    pub items: Vec<StateRecord>,
    #[serde(rename = "_metadata")]
    pub metadata: PageMetadata,
}

impl PaginatedStateRecords {
    /// The most recent record, or an empty one when the page has no items.
    #[must_use]
    pub fn into_latest(self) -> StateRecord {
        self.items.into_iter().next().unwrap_or_default()
    }
}

/// One entry of a batched state update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectStateChange {
    pub object_id: ObjectId,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub state_additional_properties: Attributes,
}

impl ObjectStateChange {
    #[must_use]
    pub fn new(object_id: impl Into<ObjectId>, state: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            state: state.into(),
            state_additional_properties: Attributes::new(),
        }
    }
}

/// Per-object outcome of a batched state change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StateChangeOutcome {
    pub object_id: ObjectId,
    pub datetime: String,
    pub error: String,
    pub changed: bool,
    pub object_state: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeValue;

    #[test]
    fn should_decode_paginated_state_records() {
        let json = r#"{
            "items": [{
                "id": "s-1",
                "object_id": "drv:1:relay",
                "datetime": "2019-07-30T06:43:40.252Z",
                "domain": "switch",
                "state": {
                    "state": "switch.state.on",
                    "state_additional_properties": {"value": "1"}
                }
            }],
            "_metadata": {"total_items": 1, "limit": 1, "offset": 0}
        }"#;
        let page: PaginatedStateRecords = serde_json::from_str(json).unwrap();
        assert_eq!(page.metadata.total_items, 1);
        let latest = page.into_latest();
        assert_eq!(latest.state.state, "switch.state.on");
        assert!(latest.datetime.is_some());
        assert_eq!(
            latest.state.state_additional_properties.get("value"),
            Some(&AttributeValue::String("1".to_string()))
        );
    }

    #[test]
    fn should_return_empty_record_when_page_is_empty() {
        let page: PaginatedStateRecords = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(page.into_latest(), StateRecord::default());
    }

    #[test]
    fn should_decode_state_change_outcome_with_error() {
        let json = r#"{"object_id": "a", "error": "object is disabled", "changed": false}"#;
        let outcome: StateChangeOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.error, "object is disabled");
        assert!(!outcome.changed);
    }
}

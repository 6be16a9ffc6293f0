//! Hub-side devices: children, device states, audit logs and hub version.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::HubLinkError;

/// Oldest hub major version the driver can talk to.
pub const MIN_HUB_MAJOR_VERSION: u32 = 2;

/// A device attached under a parent device on the hub.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChildDevice {
    pub username: String,
    pub password: String,
    pub ip_address_public: String,
    pub port: i64,
    pub id: String,
    pub id_model: i64,
    /// Filled from `params.child_id` when the hub only sends it there.
    pub child_id: String,
    pub id_brand: i64,
    pub id_manufacturer: i64,
    pub id_device_group: i64,
    pub id_sub_system: i64,
    pub params: BTreeMap<String, serde_json::Value>,
}

impl ChildDevice {
    /// Copy a string `params.child_id` into [`child_id`](Self::child_id).
    #[must_use]
    pub fn with_child_id_from_params(mut self) -> Self {
        if let Some(child_id) = self.params.get("child_id").and_then(serde_json::Value::as_str) {
            self.child_id = child_id.to_string();
        }
        self
    }
}

/// One stored state of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceStateRecord {
    pub id: i64,
    pub device_id: i64,
    pub state: String,
    pub datetime: String,
    #[serde(rename = "prev_state")]
    pub previous_state: String,
}

/// A line written to a device's audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditLogEntry {
    /// Sent as a string, as the hub expects.
    pub device_id: String,
    pub message: String,
    /// `"NULL"` when the entry is not tied to an action.
    pub action: String,
}

impl AuditLogEntry {
    #[must_use]
    pub fn new(device_id: i64, message: impl Into<String>, action: Option<&str>) -> Self {
        Self {
            device_id: device_id.to_string(),
            message: message.into(),
            action: action.unwrap_or("NULL").to_string(),
        }
    }
}

/// Answer of the hub's version endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubVersion {
    pub version: String,
    pub git_commit_sha: String,
}

impl HubVersion {
    /// Leading numeric component of the version, ignoring a `v` prefix.
    #[must_use]
    pub fn major(&self) -> Option<u32> {
        let version = self.version.trim().trim_start_matches('v');
        let digits: String = version.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }

    /// # Errors
    ///
    /// Returns [`HubLinkError::UnsupportedHubVersion`] when the version is
    /// missing or older than [`MIN_HUB_MAJOR_VERSION`].
    pub fn ensure_supported(&self) -> Result<(), HubLinkError> {
        match self.major() {
            Some(major) if major >= MIN_HUB_MAJOR_VERSION => Ok(()),
            _ => Err(HubLinkError::UnsupportedHubVersion(self.version.clone())),
        }
    }
}

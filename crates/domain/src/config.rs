//! Configuration-channel messages and the configuration key vocabulary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::RequestId;

macro_rules! config_keys {
    ($($variant:ident => $wire:literal,)*) => {
        /// A configuration request kind, keyed by its wire name.
        ///
        /// Keys the driver does not know stay representable as
        /// [`ConfigKey::Other`] so they can be answered with "not found".
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum ConfigKey {
            $($variant,)*
            Other(String),
        }

        impl ConfigKey {
            /// Every well-known key.
            pub const ALL: &'static [ConfigKey] = &[$(ConfigKey::$variant,)*];

            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)*
                    Self::Other(raw) => raw,
                }
            }
        }

        impl From<&str> for ConfigKey {
            fn from(value: &str) -> Self {
                match value {
                    $($wire => Self::$variant,)*
                    other => Self::Other(other.to_string()),
                }
            }
        }
    };
}

config_keys! {
    ActionAlarmArmPartition => "actionAlarmArmPartition",
    ActionAlarmDisarmPartition => "actionAlarmDisarmPartition",
    ActionAlarmFapPartition => "actionAlarmFAPPartition",
    ActionListenEvents => "actionListenEvent",
    ActionOutputPulse => "actionOutputPulse",
    ActionPingDevice => "actionPingDevice",
    ActionPlayAudioClip => "actionPlayAudioClip",
    ActionRestartDevice => "actionRestart",
    ActionStopListenEvent => "actionStopListenEvent",
    ActionZoom => "actionZoom",
    DeleteAllPeopleAc => "deleteAllPeopleAC",
    DeleteUser => "deleteUser",
    GetAlarmArmStates => "getAlarmArmStates",
    GetAlarmFapStates => "getAlarmFapStates",
    GetAlarmPartitionZones => "getAlarmPartitionZones",
    GetAlarmPartitions => "getAlarmPartitions",
    GetAlarmUsers => "getAlarmUsers",
    GetAlarmZoneStatus => "getAlarmZoneStatus",
    GetAlarmZones => "getAlarmZones",
    GetAllPeopleFromAc => "getAllPeopleFromAC",
    GetAvailableOutputs => "getAvailableOutputs",
    GetAvailableSpeakers => "getAvailableSpeakers",
    GetAvailableVideoResolutions => "getAvailableVideoResolutions",
    GetChannels => "getChannels",
    GetCurrentVideoResolutionByChannel => "getCurrentVideoResolutionByChannel",
    GetDiscoveredDevices => "getDiscoveredDevices",
    GetEventsAvailable => "getEventsAvailable",
    GetExtraDeviceFields => "getExtraDeviceFields",
    GetFlipVideoStatus => "getFlipVideoStatus",
    GetFtpInfo => "getFtpInfo",
    GetHeatmapImage => "getHeatmapImage",
    GetInputs => "getInputs",
    GetMicrophones => "getMicrophones",
    GetMirrorVideoStatus => "getMirrorVideoStatus",
    GetPeopleCounting => "getPeopleCounting",
    GetRecordingRanges => "getRecordingRanges",
    GetRecordingSource => "getRecordingSource",
    GetStorages => "getStorages",
    GetSubdevices => "getSubdevices",
    GetUnlockDeviceStatus => "getUnlockDeviceStatus",
    GetUsers => "getUsers",
    GetVideoInBlackAndWhiteStatus => "getVideoInBlackAndWhiteStatus",
    RequestCreateObjects => "requestCreateObjects",
    SetActionUnlockDevice => "setActionUnlockDevice",
    SetAddAlarmPartitionZone => "setAddAlarmPartitionZone",
    SetAddAlarmUser => "setAddAlarmUser",
    SetAddPersonToAc => "setAddPersonToAC",
    SetAlarmPartition => "setAlarmPartition",
    SetAlarmPartitionZoneBypass => "setAlarmPartitionZoneBypass",
    SetAlarmUser => "setAlarmUser",
    SetAlarmZone => "setAlarmZone",
    SetBackgroundImage => "setBackgroundImage",
    SetBlockPersonToAc => "setBlockPersonToAC",
    SetCardToPersonAc => "setCardToPersonAC",
    SetDeleteAlarmPartitionZone => "setDeleteAlarmPartitionZone",
    SetDeleteStorage => "setDeleteStorage",
    SetDeleteUser => "setDeleteUser",
    SetDelPersonToAc => "setDelPersonToAC",
    SetFaceToPersonAc => "setFaceToPersonAC",
    SetFlipVideo => "setFlipVideo",
    SetFtpInfo => "setFtpInfo",
    SetMirrorVideo => "setMirrorVideo",
    SetQrToPersonAc => "setQRToPersonAC",
    SetUsers => "setUsers",
    SetVideoInBlackAndWhite => "setVideoInBlackAndWhite",
    SetVideoResolution => "setVideoResolution",
    SaveVideoEngine => "SAVE_VIDEO_ENGINE",
}

impl From<String> for ConfigKey {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ConfigKey> for String {
    fn from(key: ConfigKey) -> Self {
        match key {
            ConfigKey::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection details of the device a configuration request targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceData {
    /// Device login.
    pub username: String,
    /// Device password.
    pub password: String,
    /// Address the driver reaches the device on.
    #[serde(rename = "ip_address_public")]
    pub ip_address: String,
    /// Display name given on the hub.
    #[serde(rename = "device_name")]
    pub name: String,
    /// Plain port as entered on the hub; not range-checked.
    pub port: i64,
    /// Whether `ssl_port` should be used instead of `port`.
    pub is_ssl: bool,
    /// TLS port as entered on the hub; not range-checked.
    pub ssl_port: i64,
    /// Hub-side numeric id of the device.
    #[serde(rename = "id_device")]
    pub id: i64,
    /// Sub-device addressed inside the device, empty for the device itself.
    pub child_id: String,
    /// Driver-specific fields declared through `getExtraDeviceFields`.
    pub extrafields: BTreeMap<String, serde_json::Value>,
}

impl DeviceData {
    /// The port to connect to, `None` when it is not a valid TCP port.
    #[must_use]
    pub fn connect_port(&self) -> Option<u16> {
        let port = if self.is_ssl { self.ssl_port } else { self.port };
        u16::try_from(port).ok().filter(|port| *port != 0)
    }
}

/// An inbound configuration request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationRequest {
    /// Which handler answers the request.
    #[serde(rename = "configKey")]
    pub config_key: ConfigKey,
    /// Handler argument, often a JSON document in a string.
    #[serde(default)]
    pub value: String,
    /// Echoed back in the response.
    #[serde(rename = "requestId", default)]
    pub request_id: RequestId,
    /// Device the request targets, absent for driver-wide requests.
    #[serde(rename = "deviceData", default)]
    pub device_data: Option<DeviceData>,
}

/// The reply to a [`ConfigurationRequest`], correlated by `request_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationResponse {
    /// Copied from the request.
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
    /// Handler output, or a serialized [`ConfigReply`].
    pub data: String,
}

/// The generic `{error, msg}` reply body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigReply {
    /// Whether the request failed.
    pub error: bool,
    /// Human-readable outcome.
    pub msg: String,
}

impl ConfigReply {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            error: false,
            msg: "OK".to_string(),
        }
    }

    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            error: true,
            msg: msg.into(),
        }
    }

    /// Reply for a key with no registered handler.
    #[must_use]
    pub fn not_found(key: &ConfigKey) -> Self {
        Self::error(format!("'{key}' not found on the driver"))
    }

    /// JSON text of this reply.
    #[must_use]
    pub fn to_json(&self) -> String {
        // A struct of a bool and a string always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Value carried by a `SAVE_VIDEO_ENGINE` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VideoEngineSetting {
    /// Id of the video engine object that now serves the driver.
    #[serde(default)]
    pub video_engine: String,
}

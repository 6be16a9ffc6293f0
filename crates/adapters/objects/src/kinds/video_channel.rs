//! Video channel: one camera stream with snapshot and PTZ control.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hublink_domain::attribute::{self, Attributes};
use hublink_domain::error::HubLinkError;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;

use crate::context::{
    Callback, ObjectContext, SetupCallback, decode_payload, registrable_object, unsupported,
};

pub const STATE_STREAMING: &str = "video_channel.state.streaming";
pub const STATE_RECORDING: &str = "video_channel.state.recording";
pub const STATE_IDLE: &str = "video_channel.state.idle";
pub const STATE_UNKNOWN: &str = "video_channel.state.unknown";

pub const ACTION_SNAPSHOT: &str = "video_channel.action.snapshot";
pub const ACTION_PTZ_CONTROL: &str = "video_channel.action.ptz_control";

/// Pan / tilt / zoom command, absolute unless `relative` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PtzControl {
    pub pan: i32,
    pub tilt: i32,
    pub zoom: i32,
    pub relative: bool,
}

pub struct VideoChannel {
    context: ObjectContext,
    on_setup: Option<SetupCallback>,
    on_snapshot: Option<Callback<(), Attributes>>,
    on_ptz_control: Option<Callback<PtzControl>>,
}

impl VideoChannel {
    const STATES: &'static [&'static str] = &[STATE_STREAMING, STATE_RECORDING, STATE_IDLE, STATE_UNKNOWN];
    const ACTIONS: &'static [&'static str] = &[ACTION_SNAPSHOT, ACTION_PTZ_CONTROL];

    #[must_use]
    pub fn new(metadata: ObjectMetadata) -> Self {
        Self {
            context: ObjectContext::new(metadata),
            on_setup: None,
            on_snapshot: None,
            on_ptz_control: None,
        }
    }

    #[must_use]
    pub fn on_setup(mut self, callback: SetupCallback) -> Self {
        self.on_setup = Some(callback);
        self
    }

    /// The callback's attributes (e.g. an image URL) become the result.
    #[must_use]
    pub fn on_snapshot(mut self, callback: Callback<(), Attributes>) -> Self {
        self.on_snapshot = Some(callback);
        self
    }

    #[must_use]
    pub fn on_ptz_control(mut self, callback: Callback<PtzControl>) -> Self {
        self.on_ptz_control = Some(callback);
        self
    }

    pub async fn set_mode_streaming(&self) -> Result<(), HubLinkError> {
        self.context.set_state(STATE_STREAMING).await
    }

    pub async fn set_mode_recording(&self) -> Result<(), HubLinkError> {
        self.context.set_state(STATE_RECORDING).await
    }

    pub async fn set_mode_idle(&self) -> Result<(), HubLinkError> {
        self.context.set_state(STATE_IDLE).await
    }

    pub async fn set_mode_unknown(&self) -> Result<(), HubLinkError> {
        self.context.set_state(STATE_UNKNOWN).await
    }

    pub async fn primary_stream(&self, stream_id: impl Into<String>) -> Result<(), HubLinkError> {
        self.context
            .update_state_attributes(attribute::single("primary_stream", stream_id.into()))
            .await
    }

    pub async fn secondary_stream(&self, stream_id: impl Into<String>) -> Result<(), HubLinkError> {
        self.context
            .update_state_attributes(attribute::single("secondary_stream", stream_id.into()))
            .await
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
        match action {
            ACTION_SNAPSHOT => {
                self.context
                    .invoke(action, self.on_snapshot.as_ref(), ())
                    .await
            }
            ACTION_PTZ_CONTROL => {
                let command = decode_payload(action, payload)?;
                self.context
                    .invoke(action, self.on_ptz_control.as_ref(), command)
                    .await?;
                Ok(Attributes::new())
            }
            _ => Err(unsupported(action)),
        }
    }
}

registrable_object!(VideoChannel, "video_channel");

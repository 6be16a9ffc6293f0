//! In-memory port implementations for tests.
//!
//! Enabled for this crate's own tests and, through the `testing` feature, for
//! downstream crates.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use hublink_domain::attribute::Attributes;
use hublink_domain::device::{AuditLogEntry, ChildDevice, DeviceStateRecord, HubVersion};
use hublink_domain::error::HubLinkError;
use hublink_domain::event::{Event, EventPatch, EventRecord, NewEventRequest};
use hublink_domain::event_type::EventType;
use hublink_domain::id::{ExecutionId, ObjectId};
use hublink_domain::object::{ObjectAction, ObjectDescriptor};
use hublink_domain::state::{ObjectStateChange, StateChangeOutcome, StateRecord};

use crate::ports::HubClient;

/// One call received by a [`RecordingHubClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum HubCall {
    CreateObject(ObjectDescriptor),
    NewAction(ObjectAction),
    SetState(ObjectId, String),
    UpdateStateAttributes(ObjectId, Attributes),
    UpdateStateAttributesBatch(Vec<ObjectStateChange>),
    SetObjectsBatchState(Vec<ObjectStateChange>),
    UpdateResultAttributes(ExecutionId, Attributes),
    AddEventTypes(Vec<EventType>),
    Increment(ObjectId),
    Decrement(ObjectId),
    GetState(ObjectId),
    EnableObject(ObjectId),
    DisableObject(ObjectId),
    DispatchEvent(NewEventRequest),
    PatchEvent(String),
    GetChildren(i64),
    WriteLog(AuditLogEntry),
    GetDeviceState(i64),
    SetDeviceState(i64, String),
    RtspToStreamId(String, String),
    UploadFile(String, usize),
    HubVersion,
}

/// [`HubClient`] that records every call and answers with success.
#[derive(Default)]
pub struct RecordingHubClient {
    calls: Mutex<Vec<HubCall>>,
    fail_create_object: Mutex<Option<(u16, String)>>,
}

impl RecordingHubClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `create_object` fail with the given status and body.
    pub fn fail_create_object(&self, status: u16, body: &str) {
        *self
            .fail_create_object
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((status, body.to_string()));
    }

    #[must_use]
    pub fn calls(&self) -> Vec<HubCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every reported action result, in arrival order.
    #[must_use]
    pub fn results(&self) -> Vec<(ExecutionId, Attributes)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HubCall::UpdateResultAttributes(id, attrs) => Some((id, attrs)),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `count` action results were reported.
    ///
    /// # Panics
    ///
    /// Panics if they do not arrive within two seconds.
    pub async fn wait_for_results(&self, count: usize) -> Vec<(ExecutionId, Attributes)> {
        for _ in 0..200 {
            let results = self.results();
            if results.len() >= count {
                return results;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} action results, got {:?}", self.results());
    }

    fn record(&self, call: HubCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

#[async_trait]
impl HubClient for RecordingHubClient {
    async fn create_object(&self, object: &ObjectDescriptor) -> Result<(), HubLinkError> {
        self.record(HubCall::CreateObject(object.clone()));
        let failure = self
            .fail_create_object
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match failure {
            Some((status, body)) => Err(HubLinkError::Rejected { status, body }),
            None => Ok(()),
        }
    }

    async fn new_action(&self, action: &ObjectAction) -> Result<(), HubLinkError> {
        self.record(HubCall::NewAction(action.clone()));
        Ok(())
    }

    async fn set_state(&self, object_id: &ObjectId, state: &str) -> Result<(), HubLinkError> {
        self.record(HubCall::SetState(object_id.clone(), state.to_string()));
        Ok(())
    }

    async fn update_state_attributes(
        &self,
        object_id: &ObjectId,
        attributes: &Attributes,
    ) -> Result<(), HubLinkError> {
        self.record(HubCall::UpdateStateAttributes(
            object_id.clone(),
            attributes.clone(),
        ));
        Ok(())
    }

    async fn update_state_attributes_batch(
        &self,
        changes: &[ObjectStateChange],
    ) -> Result<(), HubLinkError> {
        self.record(HubCall::UpdateStateAttributesBatch(changes.to_vec()));
        Ok(())
    }

    async fn set_objects_batch_state(
        &self,
        changes: &[ObjectStateChange],
    ) -> Result<Vec<StateChangeOutcome>, HubLinkError> {
        self.record(HubCall::SetObjectsBatchState(changes.to_vec()));
        Ok(Vec::new())
    }

    async fn update_result_attributes(
        &self,
        execution_id: &ExecutionId,
        attributes: &Attributes,
    ) -> Result<(), HubLinkError> {
        self.record(HubCall::UpdateResultAttributes(
            execution_id.clone(),
            attributes.clone(),
        ));
        Ok(())
    }

    async fn add_event_types(&self, event_types: &[EventType]) -> Result<(), HubLinkError> {
        self.record(HubCall::AddEventTypes(event_types.to_vec()));
        Ok(())
    }

    async fn increment(&self, object_id: &ObjectId) -> Result<(), HubLinkError> {
        self.record(HubCall::Increment(object_id.clone()));
        Ok(())
    }

    async fn decrement(&self, object_id: &ObjectId) -> Result<(), HubLinkError> {
        self.record(HubCall::Decrement(object_id.clone()));
        Ok(())
    }

    async fn get_state(&self, object_id: &ObjectId) -> Result<StateRecord, HubLinkError> {
        self.record(HubCall::GetState(object_id.clone()));
        Ok(StateRecord::default())
    }

    async fn enable_object(&self, object_id: &ObjectId) -> Result<(), HubLinkError> {
        self.record(HubCall::EnableObject(object_id.clone()));
        Ok(())
    }

    async fn disable_object(&self, object_id: &ObjectId) -> Result<(), HubLinkError> {
        self.record(HubCall::DisableObject(object_id.clone()));
        Ok(())
    }

    async fn dispatch_event(
        &self,
        domain: &str,
        event_key: &str,
        event: Event,
    ) -> Result<String, HubLinkError> {
        self.record(HubCall::DispatchEvent(NewEventRequest::new(
            domain, event_key, event,
        )));
        Ok(String::new())
    }

    async fn get_event(&self, event_id: &str) -> Result<EventRecord, HubLinkError> {
        Ok(EventRecord {
            id: event_id.to_string(),
            ..EventRecord::default()
        })
    }

    async fn patch_event(&self, event_id: &str, _patch: EventPatch) -> Result<(), HubLinkError> {
        self.record(HubCall::PatchEvent(event_id.to_string()));
        Ok(())
    }

    async fn get_children(&self, parent_id: i64) -> Result<Vec<ChildDevice>, HubLinkError> {
        self.record(HubCall::GetChildren(parent_id));
        Ok(Vec::new())
    }

    async fn write_log(&self, entry: &AuditLogEntry) -> Result<(), HubLinkError> {
        self.record(HubCall::WriteLog(entry.clone()));
        Ok(())
    }

    async fn get_device_state(&self, device_id: i64) -> Result<DeviceStateRecord, HubLinkError> {
        self.record(HubCall::GetDeviceState(device_id));
        Ok(DeviceStateRecord {
            device_id,
            ..DeviceStateRecord::default()
        })
    }

    async fn set_device_state(&self, device_id: i64, state: &str) -> Result<(), HubLinkError> {
        self.record(HubCall::SetDeviceState(device_id, state.to_string()));
        Ok(())
    }

    async fn rtsp_to_stream_id(&self, rtsp: &str, name: &str) -> Result<String, HubLinkError> {
        self.record(HubCall::RtspToStreamId(rtsp.to_string(), name.to_string()));
        Ok(format!("stream-{name}"))
    }

    async fn upload_file(&self, file_name: &str, content: &[u8]) -> Result<String, HubLinkError> {
        self.record(HubCall::UploadFile(file_name.to_string(), content.len()));
        Ok(format!("http://hub/public/{file_name}"))
    }

    async fn hub_version(&self) -> Result<HubVersion, HubLinkError> {
        self.record(HubCall::HubVersion);
        Ok(HubVersion {
            version: "2.0.0".to_string(),
            ..HubVersion::default()
        })
    }
}

//! Hub port: the outbound operations a driver performs against the hub.
//!
//! Objects receive this port during setup and use it to report their state.
//! The registry and dispatcher use it to register objects and to report
//! action results.

use async_trait::async_trait;

use hublink_domain::attribute::Attributes;
use hublink_domain::device::{AuditLogEntry, ChildDevice, DeviceStateRecord, HubVersion};
use hublink_domain::error::HubLinkError;
use hublink_domain::event::{Event, EventPatch, EventRecord};
use hublink_domain::event_type::EventType;
use hublink_domain::id::{ExecutionId, ObjectId};
use hublink_domain::object::{ObjectAction, ObjectDescriptor};
use hublink_domain::state::{ObjectStateChange, StateChangeOutcome, StateRecord};

/// Authenticated operations on the hub.
///
/// Implementations must be cheap to share (`Arc<dyn HubClient>`) and must
/// apply a bounded timeout to every call.
#[async_trait]
pub trait HubClient: Send + Sync {
    /// Create an object. An "already exists" answer is treated as success.
    async fn create_object(&self, object: &ObjectDescriptor) -> Result<(), HubLinkError>;

    /// Register an action for a domain. An "already exists" answer is treated as success.
    async fn new_action(&self, action: &ObjectAction) -> Result<(), HubLinkError>;

    /// Set the state of an object. A disabled object is not an error.
    async fn set_state(&self, object_id: &ObjectId, state: &str) -> Result<(), HubLinkError>;

    /// Merge additional properties into the current state of an object.
    async fn update_state_attributes(
        &self,
        object_id: &ObjectId,
        attributes: &Attributes,
    ) -> Result<(), HubLinkError>;

    /// Update state and properties of several objects in one call.
    async fn update_state_attributes_batch(
        &self,
        changes: &[ObjectStateChange],
    ) -> Result<(), HubLinkError>;

    /// Set states of several objects, failing if any entry was refused.
    async fn set_objects_batch_state(
        &self,
        changes: &[ObjectStateChange],
    ) -> Result<Vec<StateChangeOutcome>, HubLinkError>;

    /// Report the outcome of an action execution.
    async fn update_result_attributes(
        &self,
        execution_id: &ExecutionId,
        attributes: &Attributes,
    ) -> Result<(), HubLinkError>;

    /// Register event types, in batches, falling back to one-by-one creation
    /// when the hub has no batch endpoint.
    async fn add_event_types(&self, event_types: &[EventType]) -> Result<(), HubLinkError>;

    async fn increment(&self, object_id: &ObjectId) -> Result<(), HubLinkError>;

    async fn decrement(&self, object_id: &ObjectId) -> Result<(), HubLinkError>;

    /// Most recent state record, or an empty record when the object has none.
    async fn get_state(&self, object_id: &ObjectId) -> Result<StateRecord, HubLinkError>;

    async fn enable_object(&self, object_id: &ObjectId) -> Result<(), HubLinkError>;

    async fn disable_object(&self, object_id: &ObjectId) -> Result<(), HubLinkError>;

    /// Raise an event of type `<domain>.<event_key>`, returning the hub's answer.
    async fn dispatch_event(
        &self,
        domain: &str,
        event_key: &str,
        event: Event,
    ) -> Result<String, HubLinkError>;

    async fn get_event(&self, event_id: &str) -> Result<EventRecord, HubLinkError>;

    /// Read-modify-write of a stored event.
    async fn patch_event(&self, event_id: &str, patch: EventPatch) -> Result<(), HubLinkError>;

    /// Devices attached under `parent_id`.
    async fn get_children(&self, parent_id: i64) -> Result<Vec<ChildDevice>, HubLinkError>;

    /// Append an entry to a device's audit log.
    async fn write_log(&self, entry: &AuditLogEntry) -> Result<(), HubLinkError>;

    /// Current state of a device. [`HubLinkError::NotFound`] when it has none.
    async fn get_device_state(&self, device_id: i64) -> Result<DeviceStateRecord, HubLinkError>;

    async fn set_device_state(&self, device_id: i64, state: &str) -> Result<(), HubLinkError>;

    /// Register an RTSP source with the hub's video service and return its stream id.
    async fn rtsp_to_stream_id(&self, rtsp: &str, name: &str) -> Result<String, HubLinkError>;

    /// Upload a file and return the public URL the hub serves it under.
    async fn upload_file(&self, file_name: &str, content: &[u8]) -> Result<String, HubLinkError>;

    /// Version the hub reports about itself.
    async fn hub_version(&self) -> Result<HubVersion, HubLinkError>;
}

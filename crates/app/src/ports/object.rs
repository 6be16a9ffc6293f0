//! Object port: what every registrable object kind provides.
//!
//! Implementations live in adapter crates (e.g. `adapter_objects`). The
//! registry drives them in this order:
//!
//! 1. [`descriptor`](RegistrableObject::descriptor): sent to the hub on registration
//! 2. [`setup`](RegistrableObject::setup): receives the hub client, may start background work
//! 3. [`run_action`](RegistrableObject::run_action): once per addressed action execution

use std::sync::Arc;

use async_trait::async_trait;

use hublink_domain::attribute::Attributes;
use hublink_domain::error::HubLinkError;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::{ObjectAction, ObjectDescriptor, ObjectMetadata};

use super::hub::HubClient;

/// A typed object that can be registered with the hub and receive actions.
#[async_trait]
pub trait RegistrableObject: Send + Sync {
    /// Metadata with `object_type` set to this object's kind.
    fn metadata(&self) -> ObjectMetadata;

    fn available_states(&self) -> Vec<String>;

    fn available_actions(&self) -> Vec<ObjectAction>;

    /// Hand the object its hub client and run driver-supplied setup.
    async fn setup(&self, hub: Arc<dyn HubClient>) -> Result<(), HubLinkError>;

    /// Run `action`, returning the attributes reported as the execution result.
    async fn run_action(
        &self,
        execution_id: &ExecutionId,
        action: &str,
        payload: &serde_json::Value,
    ) -> Result<Attributes, HubLinkError>;

    async fn set_state(&self, state: &str) -> Result<(), HubLinkError>;

    async fn update_state_attributes(&self, attributes: Attributes) -> Result<(), HubLinkError>;

    fn descriptor(&self) -> ObjectDescriptor {
        ObjectDescriptor {
            metadata: self.metadata(),
            available_states: self.available_states(),
            available_actions: self.available_actions(),
        }
    }
}

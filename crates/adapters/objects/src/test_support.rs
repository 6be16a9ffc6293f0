//! Helpers shared by the object kind tests.

use std::sync::Arc;

use hublink_app::ports::RegistrableObject;
use hublink_app::testing::{HubCall, RecordingHubClient};
use hublink_domain::attribute::Attributes;
use hublink_domain::object::ObjectMetadata;

pub fn metadata(object_id: &str, domain: &str) -> ObjectMetadata {
    ObjectMetadata::builder()
        .object_id(object_id)
        .name(object_id)
        .domain(domain)
        .device_id("1")
        .build()
        .unwrap()
}

/// Run `setup` against a fresh recording hub.
pub async fn set_up(object: &dyn RegistrableObject) -> Arc<RecordingHubClient> {
    let hub = Arc::new(RecordingHubClient::new());
    object.setup(hub.clone()).await.unwrap();
    hub
}

pub fn states(hub: &RecordingHubClient) -> Vec<String> {
    hub.calls()
        .into_iter()
        .filter_map(|call| match call {
            HubCall::SetState(_, state) => Some(state),
            _ => None,
        })
        .collect()
}

pub fn attribute_updates(hub: &RecordingHubClient) -> Vec<Attributes> {
    hub.calls()
        .into_iter()
        .filter_map(|call| match call {
            HubCall::UpdateStateAttributes(_, attributes) => Some(attributes),
            _ => None,
        })
        .collect()
}

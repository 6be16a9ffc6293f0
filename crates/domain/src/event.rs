//! Events raised by the driver and stored by the hub.

use serde::{Deserialize, Serialize};

use crate::attribute::Attributes;
use crate::id::ObjectId;

/// An occurrence to report, before it is addressed to an event type.
#[derive(Debug, Clone, Default)]
pub struct Event {
    pub object_ids: Vec<ObjectId>,
    pub image_urls: Vec<String>,
    pub video_urls: Vec<String>,
    pub properties: Attributes,
}

/// Body of `POST /objects/events`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEventRequest {
    pub event_type: String,
    pub rels: Vec<String>,
    pub event_additional_properties: Attributes,
    pub images: Vec<String>,
    pub video_clips: Vec<String>,
}

impl NewEventRequest {
    /// Address `event` to the `<domain>.<event_key>` event type.
    #[must_use]
    pub fn new(domain: &str, event_key: &str, event: Event) -> Self {
        Self {
            event_type: format!("{domain}.{event_key}"),
            rels: event
                .object_ids
                .iter()
                .map(|id| format!("/objects/{id}"))
                .collect(),
            event_additional_properties: event.properties,
            images: event.image_urls,
            video_clips: event.video_urls,
        }
    }
}

/// An event as stored by the hub.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    pub id: String,
    pub event_type: String,
    pub rels: Vec<String>,
    pub event_additional_properties: Attributes,
    pub images: Vec<String>,
    pub video_clips: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
}

/// Changes to apply to a stored event.
///
/// `None` leaves a field untouched, an empty collection clears it and a
/// non-empty one is appended (lists) or merged (properties).
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub images: Option<Vec<String>>,
    pub video_clips: Option<Vec<String>>,
    pub properties: Option<Attributes>,
}

impl EventRecord {
    /// Apply `patch` in place.
    pub fn apply(&mut self, patch: EventPatch) {
        if let Some(images) = patch.images {
            merge_list(&mut self.images, images);
        }
        if let Some(clips) = patch.video_clips {
            merge_list(&mut self.video_clips, clips);
        }
        if let Some(properties) = patch.properties {
            if properties.is_empty() {
                self.event_additional_properties.clear();
            } else {
                self.event_additional_properties.extend(properties);
            }
        }
    }
}

fn merge_list(current: &mut Vec<String>, incoming: Vec<String>) {
    if incoming.is_empty() {
        current.clear();
    } else {
        current.extend(incoming);
    }
}

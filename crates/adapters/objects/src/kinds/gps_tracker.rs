//! GPS tracker: reports a geographic position and battery level.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hublink_domain::attribute::{self, AttributeValue, Attributes};
use hublink_domain::error::HubLinkError;
use hublink_domain::id::ExecutionId;
use hublink_domain::object::ObjectMetadata;
use hublink_domain::time::{now, to_iso8601};

use crate::context::{ObjectContext, SetupCallback, registrable_object, unsupported};

/// A full position fix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsFix {
    pub battery_level: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub location_accuracy: i64,
    pub location_name: String,
}

pub struct GpsTracker {
    context: ObjectContext,
    on_setup: Option<SetupCallback>,
}

impl GpsTracker {
    const STATES: &'static [&'static str] = &[];
    const ACTIONS: &'static [&'static str] = &[];

    #[must_use]
    pub fn new(metadata: ObjectMetadata) -> Self {
        Self {
            context: ObjectContext::new(metadata),
            on_setup: None,
        }
    }

    #[must_use]
    pub fn on_setup(mut self, callback: SetupCallback) -> Self {
        self.on_setup = Some(callback);
        self
    }

    pub async fn set_battery_level(&self, level: i64) -> Result<(), HubLinkError> {
        self.set("batteryLevel", level).await
    }

    pub async fn set_latitude(&self, latitude: f64) -> Result<(), HubLinkError> {
        self.set("latitude", latitude).await
    }

    pub async fn set_longitude(&self, longitude: f64) -> Result<(), HubLinkError> {
        self.set("longitude", longitude).await
    }

    pub async fn set_location_accuracy(&self, accuracy: i64) -> Result<(), HubLinkError> {
        self.set("locationAccuracy", accuracy).await
    }

    pub async fn set_location_name(&self, name: impl Into<String>) -> Result<(), HubLinkError> {
        self.set("locationName", name.into()).await
    }

    /// Publish every field of `fix` in one update, stamped with the current
    /// time as `timestamp`.
    ///
    /// # Errors
    ///
    /// Fails before setup or when the hub refuses the update.
    pub async fn set_position(&self, fix: GpsFix) -> Result<(), HubLinkError> {
        let attributes = Attributes::from([
            ("batteryLevel".to_string(), fix.battery_level.into()),
            ("latitude".to_string(), fix.latitude.into()),
            ("longitude".to_string(), fix.longitude.into()),
            ("locationAccuracy".to_string(), fix.location_accuracy.into()),
            ("locationName".to_string(), fix.location_name.into()),
            ("timestamp".to_string(), to_iso8601(now()).into()),
        ]);
        self.context.update_state_attributes(attributes).await
    }

    async fn set(&self, key: &str, value: impl Into<AttributeValue>) -> Result<(), HubLinkError> {
        self.context
            .update_state_attributes(attribute::single(key, value))
            .await
    }

    async fn prepare(&self) -> Result<(), HubLinkError> {
        self.context.run_setup(self.on_setup.as_ref()).await
    }

    #[allow(clippy::unused_async)]
    async fn run(
        &self,
        _execution_id: &ExecutionId,
        action: &str,
        _payload: &Value,
    ) -> Result<Attributes, HubLinkError> {
        Err(unsupported(action))
    }
}

registrable_object!(GpsTracker, "gps_tracker");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{attribute_updates, metadata, set_up};

    #[tokio::test]
    async fn should_publish_single_fields() {
        let tracker = GpsTracker::new(metadata("van-7", "gps_tracker"));
        let hub = set_up(&tracker).await;

        tracker.set_battery_level(80).await.unwrap();
        tracker.set_latitude(48.85).await.unwrap();
        tracker.set_location_name("Depot").await.unwrap();

        let updates = attribute_updates(&hub);
        assert_eq!(updates[0]["batteryLevel"], AttributeValue::Int(80));
        assert_eq!(updates[1]["latitude"], AttributeValue::Float(48.85));
        assert_eq!(updates[2]["locationName"], AttributeValue::from("Depot"));
    }

    #[tokio::test]
    async fn should_stamp_full_position() {
        let tracker = GpsTracker::new(metadata("van-7", "gps_tracker"));
        let hub = set_up(&tracker).await;

        tracker
            .set_position(GpsFix {
                battery_level: 55,
                latitude: 48.85,
                longitude: 2.35,
                location_accuracy: 5,
                location_name: "Paris".to_string(),
            })
            .await
            .unwrap();

        let update = &attribute_updates(&hub)[0];
        assert_eq!(update.len(), 6);
        assert_eq!(update["longitude"], AttributeValue::Float(2.35));
        let AttributeValue::String(stamp) = &update["timestamp"] else {
            panic!("timestamp should be text");
        };
        assert!(stamp.ends_with('Z'));
    }
}

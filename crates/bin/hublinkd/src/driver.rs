//! Template driver: the objects and configuration handlers a real driver
//! would replace with its own hardware integration.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use hublink_adapter_objects::{Sensor, Switch, callback, sensor, switch};
use hublink_app::config_handlers::ConfigHandlerTable;
use hublink_app::ports::{RegistrableObject, handler_fn};
use hublink_domain::attribute::{self, Attributes};
use hublink_domain::config::{ConfigKey, DeviceData};
use hublink_domain::error::HubLinkError;
use hublink_domain::event_type::EventType;
use hublink_domain::object::ObjectMetadata;

const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Objects exposed by the template driver for device `device_id`.
///
/// # Errors
///
/// Returns a validation error if the metadata is incomplete.
pub fn objects(driver_id: &str, device_id: &str) -> Result<Vec<Arc<dyn RegistrableObject>>, HubLinkError> {
    let relay = Switch::new(
        ObjectMetadata::builder()
            .object_id(format!("{driver_id}:{device_id}:relay"))
            .name("Relay")
            .domain("switch")
            .device_id(device_id)
            .tag("relay")
            .build()?,
    )
    .on_setup(callback(|handle, ()| async move {
        handle.set_state(switch::STATE_OFF).await
    }))
    .on_turn_on(callback(|handle, ()| async move {
        handle.set_state(switch::STATE_ON).await?;
        handle.update_state_attributes(last_action("turn_on")).await
    }))
    .on_turn_off(callback(|handle, ()| async move {
        handle.set_state(switch::STATE_OFF).await?;
        handle.update_state_attributes(last_action("turn_off")).await
    }));

    let temperature = Sensor::new(
        ObjectMetadata::builder()
            .object_id(format!("{driver_id}:{device_id}:temperature"))
            .name("Temperature")
            .domain("sensor")
            .device_id(device_id)
            .build()?,
    )
    .on_setup(callback(|handle, ()| async move {
        handle.set_state(sensor::STATE_MEASUREMENT).await?;
        let mut attributes = attribute::single("unit_of_measurement", "°C");
        attributes.insert("value".to_string(), "0".into());
        handle.update_state_attributes(attributes).await
    }));

    Ok(vec![Arc::new(relay), Arc::new(temperature)])
}

fn last_action(action: &str) -> Attributes {
    attribute::single("last_action", action)
}

/// Configuration handlers of the template driver.
#[must_use]
pub fn config_handlers(event_catalogue: Vec<EventType>) -> ConfigHandlerTable {
    let mut table = ConfigHandlerTable::new().with(
        ConfigKey::ActionPingDevice,
        handler_fn(|_, device| async move { Ok(ping(device.as_ref()).await.to_string()) }),
    );
    if !event_catalogue.is_empty() {
        table.serve_event_catalogue(event_catalogue);
    }
    table
}

/// Whether the device accepts a TCP connection on its configured port.
async fn ping(device: Option<&DeviceData>) -> serde_json::Value {
    let Some(device) = device else {
        return json!({"status": false, "error": true, "msg": "no device data in request"});
    };
    let Some(port) = device.connect_port() else {
        return json!({"status": false, "error": true, "msg": "invalid device port"});
    };
    let address = format!("{}:{port}", device.ip_address);
    let outcome = tokio::time::timeout(PING_TIMEOUT, tokio::net::TcpStream::connect(&address)).await;
    match outcome {
        Ok(Ok(_)) => {
            tracing::debug!(%address, "device reachable");
            json!({"status": true, "error": false, "msg": "Device is online"})
        }
        Ok(Err(err)) => {
            tracing::info!(%address, error = %err, "device unreachable");
            json!({"status": false, "error": true, "msg": format!("Device unreachable: {err}")})
        }
        Err(_) => json!({"status": false, "error": true, "msg": "Device unreachable: timed out"}),
    }
}

//! # hublink-adapter-objects
//!
//! Object kinds a driver registers with the hub. Every kind implements the
//! `RegistrableObject` port and delegates hardware behaviour to callbacks
//! supplied by the driver.
//!
//! ## Provided kinds
//!
//! | Kind | Object type | Actions |
//! |------|-------------|---------|
//! | [`Switch`] | `switch` | `switch.action.turn_on`, `switch.action.turn_off` |
//! | [`Sensor`] | `sensor` | none |
//! | [`Lock`] | `lock` | `lock`, `unlock` |
//! | [`Door`] | `door` | `door.action.open`, `door.action.close` |
//! | [`Reader`] | `reader` | read, stop, reset, restart, store / delete QR codes |
//! | [`Notifier`] | `notifier` | `notifier.action.notify` |
//! | [`VideoChannel`] | `video_channel` | snapshot, PTZ control |
//! | [`VideoEngine`] | `video_engine` | none |
//! | [`AlarmPanel`] | `alarm_panel` | arm, disarm, bypass |
//! | [`Person`] | `person` | none |
//! | [`GpsTracker`] | `gps_tracker` | none |
//! | [`RelativeTracker`] | `relative_tracker` | none |
//! | [`RelativeZone`] | `relative_zone` | none |
//! | [`Octopus`] | `octopus` | relay on / off |
//!
//! ## How it works
//!
//! A kind is built from [`ObjectMetadata`](hublink_domain::object::ObjectMetadata)
//! and configured with `on_<action>` callbacks:
//!
//! ```ignore
//! let relay = Switch::new(metadata)
//!     .on_turn_on(callback(|handle, ()| async move { handle.set_state(switch::STATE_ON).await }));
//! ```
//!
//! The registry hands the object its hub client during setup; from then on
//! callbacks receive an [`ObjectHandle`] to report state and raise events.
//! Actions outside a kind's vocabulary fail with `UnsupportedAction`, and
//! actions whose callback was never supplied fail with a handler error.
//!
//! ## Dependency rule
//!
//! Depends on `hublink-app` (port traits) and `hublink-domain` only.

mod context;
pub mod kinds;

#[cfg(test)]
mod test_support;

pub use context::{
    Callback, ObjectContext, ObjectHandle, SetupCallback, callback, decode_payload, unsupported,
};
pub use kinds::{
    AlarmPanel, Door, GpsTracker, Lock, Notifier, Octopus, Person, Reader, RelativeTracker,
    RelativeZone, Sensor, Switch, VideoChannel, VideoEngine, alarm_panel, door, gps_tracker, lock,
    notifier, octopus, reader, relative_tracker, relative_zone, sensor, switch, video_channel,
    video_engine,
};

//! Object kinds. Each module holds the kind's state and action vocabulary
//! as constants next to the type that implements it.

pub mod alarm_panel;
pub mod door;
pub mod gps_tracker;
pub mod lock;
pub mod notifier;
pub mod octopus;
pub mod person;
pub mod reader;
pub mod relative_tracker;
pub mod relative_zone;
pub mod sensor;
pub mod switch;
pub mod video_channel;
pub mod video_engine;

pub use alarm_panel::{AlarmCommand, AlarmPanel, CodePolicy};
pub use door::Door;
pub use gps_tracker::{GpsFix, GpsTracker};
pub use lock::Lock;
pub use notifier::{NotificationPayload, Notifier};
pub use octopus::{Octopus, RelayPayload};
pub use person::Person;
pub use reader::{Reader, StoreQrsPayload};
pub use relative_tracker::RelativeTracker;
pub use relative_zone::{RelativeZone, Vertex, ZoneShape};
pub use sensor::{Sensor, SensorType};
pub use switch::Switch;
pub use video_channel::{PtzControl, VideoChannel};
pub use video_engine::VideoEngine;

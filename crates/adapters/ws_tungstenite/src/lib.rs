//! # hublink-adapter-ws-tungstenite
//!
//! WebSocket adapter: the two long-lived channels a driver keeps open to
//! the hub.
//!
//! ## Channels
//!
//! | Channel | Path | Headers | Direction |
//! |---------|------|---------|-----------|
//! | Action | `objects/ws` | `X-Auth-Token` | hub → driver requests, driver → hub domain subscriptions |
//! | Configuration | `ws/v1/config_communication?…` | `Authorization`, `X-Auth-Token` | request / response, correlated by `requestId` |
//!
//! Each `run_session` call is one connection attempt; [`Reconnect`] wraps a
//! session in an exponential-backoff loop. `wss://` hubs are reached with a
//! certificate verifier that accepts self-signed certificates.
//!
//! ## Dependency rule
//!
//! Depends on `hublink-app` and `hublink-domain`, never on other adapters.

mod action_listener;
mod config_listener;
mod error;
mod reconnect;
mod tls;
pub mod transport;
pub mod url;

#[cfg(test)]
mod test_support;

pub use action_listener::{ActionChannelConfig, ActionListener};
pub use config_listener::{CLOSE_TIMEOUT, ConfigChannelConfig, ConfigListener, VideoEngineSetter};
pub use error::WsError;
pub use reconnect::{Reconnect, ReconnectPolicy, SessionEnd};

//! # hublink-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `HubClient`: authenticated outbound operations on the hub
//!   - `RegistrableObject`: one typed object (switch, sensor, lock, …)
//!   - `ConfigHandler`: answers one kind of configuration request
//! - Provide the **object registry and dispatcher** (register, route actions,
//!   report results)
//! - Provide the **configuration handler table** (route requests, normalise replies)
//! - Provide **in-process infrastructure** (topic event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `hublink-domain` only (plus `tokio` for tasks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod config_handlers;
pub mod event_bus;
pub mod ports;
pub mod registry;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

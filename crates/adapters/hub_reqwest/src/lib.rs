//! # hublink-adapter-hub-reqwest
//!
//! REST adapter for the hub: implements the `HubClient` port with `reqwest`.
//!
//! ## How it works
//!
//! Every call carries the `X-Auth-Token` header and sends JSON bodies; child
//! listings and uploads add the driver key as `Authorization`, audit logs a
//! bearer token. Hub
//! answers with a status of 400 or above become
//! [`HubLinkError::Rejected`](hublink_domain::error::HubLinkError::Rejected),
//! except where the hub's answer means "nothing to do":
//!
//! | Operation | Tolerated answer |
//! |-----------|------------------|
//! | create object, register action | body contains an already-exists code |
//! | set state | body contains `object is disabled` |
//! | register event type (one by one) | body contains `Duplicate entry` |
//!
//! Event types are sent in batches of [`EVENT_TYPE_BATCH_SIZE`]. Hubs that do
//! not know the batch endpoint (404) get the remaining types one at a time.
//!
//! ## Dependency rule
//!
//! Depends on `hublink-app` and `hublink-domain`, never on other adapters.

mod client;
mod config;
mod error;

pub use client::{EVENT_TYPE_BATCH_SIZE, ReqwestHubClient};
pub use config::{HubClientConfig, normalize_host};
pub use error::HttpError;

//! # hublink-domain
//!
//! Pure domain model for a hublink driver.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Objects** (typed things a driver exposes, grouped by domain)
//! - Define **Actions** (hub requests to run something on objects)
//! - Define **States** and **Events** reported back to the hub
//! - Define **Configuration requests** and their key vocabulary
//! - Define hub-side **Devices** (children, device states, audit logs)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod attribute;
pub mod config;
pub mod device;
pub mod event;
pub mod event_type;
pub mod object;
pub mod state;

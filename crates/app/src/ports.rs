//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.
//!
//! Ports are used as trait objects (`Arc<dyn …>`), so they are declared with
//! `async_trait`.

pub mod config_handler;
pub mod hub;
pub mod object;

pub use config_handler::{ConfigHandler, handler_fn};
pub use hub::HubClient;
pub use object::RegistrableObject;

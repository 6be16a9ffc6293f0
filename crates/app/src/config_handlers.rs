//! Configuration handler table and request dispatch.
//!
//! The table is built once at startup and shared by reference with the
//! configuration listener. [`ConfigHandlerTable::handle`] turns any request
//! into a response: unknown keys and handler failures become `{error, msg}`
//! replies, never errors.

use std::collections::HashMap;
use std::sync::Arc;

use hublink_domain::config::{ConfigKey, ConfigReply, ConfigurationRequest, ConfigurationResponse};
use hublink_domain::event_type::EventType;

use crate::ports::{ConfigHandler, handler_fn};

/// Handlers keyed by configuration key.
#[derive(Default, Clone)]
pub struct ConfigHandlerTable {
    handlers: HashMap<ConfigKey, Arc<dyn ConfigHandler>>,
}

impl ConfigHandlerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `key`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, key: ConfigKey, handler: Arc<dyn ConfigHandler>) -> Self {
        self.insert(key, handler);
        self
    }

    pub fn insert(&mut self, key: ConfigKey, handler: Arc<dyn ConfigHandler>) {
        self.handlers.insert(key, handler);
    }

    #[must_use]
    pub fn contains(&self, key: &ConfigKey) -> bool {
        self.handlers.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Answer `getEventsAvailable` with a fixed catalogue, unless a handler
    /// for that key is already registered.
    pub fn serve_event_catalogue(&mut self, event_types: Vec<EventType>) {
        if self.contains(&ConfigKey::GetEventsAvailable) {
            return;
        }
        let catalogue = Arc::new(event_types);
        self.insert(
            ConfigKey::GetEventsAvailable,
            handler_fn(move |_, _| {
                let catalogue = Arc::clone(&catalogue);
                async move {
                    serde_json::to_string(catalogue.as_ref())
                        .map_err(hublink_domain::error::HubLinkError::handler)
                }
            }),
        );
    }

    /// Run the handler for `request` and build the correlated response.
    pub async fn handle(&self, request: &ConfigurationRequest) -> ConfigurationResponse {
        let key = &request.config_key;
        let data = match self.handlers.get(key) {
            None => {
                tracing::warn!(config_key = %key, request_id = %request.request_id, "no handler for configuration key");
                ConfigReply::not_found(key).to_json()
            }
            Some(handler) => match handler
                .handle(&request.value, request.device_data.as_ref())
                .await
            {
                Ok(output) if output.is_empty() || output == "null" => ConfigReply::ok().to_json(),
                Ok(output) => output,
                Err(err) => {
                    tracing::warn!(config_key = %key, request_id = %request.request_id, error = %err, "configuration handler failed");
                    ConfigReply::error(err.to_string()).to_json()
                }
            },
        };

        ConfigurationResponse {
            request_id: request.request_id.clone(),
            data,
        }
    }
}

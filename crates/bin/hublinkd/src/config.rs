//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `hublink.toml` in the working directory. Every field has a
//! default so the file is optional; only the hub host must end up set.
//! Environment variables take precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use hublink_adapter_hub_reqwest::HubClientConfig;
use hublink_adapter_ws_tungstenite::{ActionChannelConfig, ConfigChannelConfig, ReconnectPolicy};
use hublink_app::registry::DispatchOptions;
use hublink_domain::event_type::EventType;

const CONFIG_FILE: &str = "hublink.toml";
const EVENTS_FILE: &str = "events.json";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[hub]` section.
    pub hub: HubConfig,
    /// `[driver]` section.
    pub driver: DriverConfig,
    /// `[dispatch]` section.
    pub dispatch: DispatchConfig,
    /// `[reconnect]` section, shared by both hub channels.
    pub reconnect: ReconnectPolicy,
    /// `[logging]` section.
    pub logging: LoggingConfig,
}

/// Where the hub is and how to authenticate.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Hub address, with or without scheme (e.g. `hub.local:3196`).
    pub host: String,
    /// Sent as `Authorization` on the configuration channel, device
    /// listings and file uploads.
    pub driver_key: String,
    /// Sent as `X-Auth-Token` on every request.
    pub token: String,
    /// Timeout of REST calls, in seconds.
    pub timeout_secs: u64,
}

/// Identity the driver announces on the configuration channel.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Site the driver is installed on.
    pub site_id: String,
    /// Driver id assigned by the hub; prefixes every object id.
    pub driver_id: String,
    /// Driver version reported on connect.
    pub version: String,
    /// Documentation link reported on connect.
    pub documentation: String,
    /// JSON file holding the event types served for `getEventsAvailable`;
    /// `events.json` is used when present and nothing is configured.
    pub events_file: Option<String>,
}

/// Limits on action handlers.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Deadline of one action handler, in seconds.
    pub action_timeout_secs: u64,
    /// Handlers allowed to run at the same time.
    pub max_concurrent_actions: usize,
}

/// Log output settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `hublink.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if no
    /// hub host is configured.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(CONFIG_FILE)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("HUBLINK_HUB_HOST") {
            self.hub.host = val;
        }
        if let Some(val) = var("HUBLINK_DRIVER_KEY") {
            self.hub.driver_key = val;
        }
        if let Some(val) = var("HUBLINK_TOKEN") {
            self.hub.token = val;
        }
        if let Some(val) = var("HUBLINK_SITE_ID") {
            self.driver.site_id = val;
        }
        if let Some(val) = var("HUBLINK_DRIVER_ID") {
            self.driver.driver_id = val;
        }
        if let Some(val) = var("HUBLINK_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "hub host must be set (hub.host or HUBLINK_HUB_HOST)".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn hub_client(&self) -> HubClientConfig {
        HubClientConfig {
            host: self.hub.host.clone(),
            token: self.hub.token.clone(),
            driver_key: self.hub.driver_key.clone(),
            timeout_secs: self.hub.timeout_secs,
            ..HubClientConfig::default()
        }
    }

    #[must_use]
    pub fn action_channel(&self) -> ActionChannelConfig {
        ActionChannelConfig {
            host: self.hub.host.clone(),
            token: self.hub.token.clone(),
        }
    }

    #[must_use]
    pub fn config_channel(&self) -> ConfigChannelConfig {
        ConfigChannelConfig {
            host: self.hub.host.clone(),
            driver_key: self.hub.driver_key.clone(),
            token: self.hub.token.clone(),
            site_id: self.driver.site_id.clone(),
            driver_id: self.driver.driver_id.clone(),
            driver_version: self.driver.version.clone(),
            driver_documentation: self.driver.documentation.clone(),
        }
    }

    #[must_use]
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            action_timeout: Duration::from_secs(self.dispatch.action_timeout_secs),
            max_concurrent_actions: self.dispatch.max_concurrent_actions,
        }
    }
}

impl DriverConfig {
    /// Read the event catalogue, empty when no file is configured and
    /// `events.json` does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array
    /// of event types.
    pub fn event_catalogue(&self) -> Result<Vec<EventType>, ConfigError> {
        let path = self.events_file.as_deref().unwrap_or(EVENTS_FILE);
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(ConfigError::Events),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && self.events_file.is_none() => {
                Ok(Vec::new())
            }
            Err(err) => Err(ConfigError::Io(err)),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            driver_key: String::new(),
            token: String::new(),
            timeout_secs: 10,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let defaults = DispatchOptions::default();
        Self {
            action_timeout_secs: defaults.action_timeout.as_secs(),
            max_concurrent_actions: defaults.max_concurrent_actions,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hublinkd=info,hublink=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Event catalogue is not a JSON array of event types.
    #[error("failed to parse event catalogue")]
    Events(#[source] serde_json::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert!(config.hub.host.is_empty());
        assert_eq!(config.hub.timeout_secs, 10);
        assert_eq!(config.dispatch.action_timeout_secs, 30);
        assert_eq!(config.dispatch.max_concurrent_actions, 64);
        assert_eq!(config.reconnect.max_backoff_secs, 60);
        assert_eq!(config.logging.filter, "hublinkd=info,hublink=info");
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [hub]
            host = 'hub.local:3196'
            driver_key = 'key'
            token = 'tok'
            timeout_secs = 3

            [driver]
            site_id = 'site-1'
            driver_id = '42'
            version = '1.2.0'
            events_file = 'events.json'

            [dispatch]
            action_timeout_secs = 5
            max_concurrent_actions = 8

            [reconnect]
            initial_backoff_secs = 2
            max_backoff_secs = 30

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.hub.host, "hub.local:3196");
        assert_eq!(config.hub.timeout_secs, 3);
        assert_eq!(config.driver.events_file.as_deref(), Some("events.json"));
        assert_eq!(config.dispatch_options().action_timeout, Duration::from_secs(5));
        assert_eq!(config.dispatch_options().max_concurrent_actions, 8);
        assert_eq!(config.reconnect.initial_backoff_secs, 2);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let config: Config = toml::from_str("[hub]\nhost = 'hub'").unwrap();
        assert_eq!(config.hub.host, "hub");
        assert_eq!(config.hub.timeout_secs, 10);
        assert_eq!(config.dispatch.max_concurrent_actions, 64);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.hub.timeout_secs, 10);
    }

    #[test]
    fn should_prefer_environment_over_file() {
        let mut config: Config = toml::from_str("[hub]\nhost = 'from-file'").unwrap();
        config.apply_overrides(env(&[
            ("HUBLINK_HUB_HOST", "from-env"),
            ("HUBLINK_TOKEN", "tok"),
            ("HUBLINK_SITE_ID", "site-9"),
            ("HUBLINK_LOG", "warn"),
        ]));
        assert_eq!(config.hub.host, "from-env");
        assert_eq!(config.hub.token, "tok");
        assert_eq!(config.driver.site_id, "site-9");
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_let_rust_log_win_over_hublink_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("HUBLINK_LOG", "warn"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_reject_missing_host() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_share_identity_across_channels() {
        let mut config = Config::default();
        config.hub.host = "hub:3196".to_string();
        config.hub.token = "tok".to_string();
        config.hub.driver_key = "key".to_string();
        config.driver.driver_id = "7".to_string();

        assert_eq!(config.hub_client().host, "hub:3196");
        assert_eq!(config.hub_client().driver_key, "key");
        assert!(config.hub_client().accept_invalid_certs);
        assert_eq!(config.action_channel().token, "tok");
        let channel = config.config_channel();
        assert_eq!(channel.driver_key, "key");
        assert_eq!(channel.driver_id, "7");
    }

    #[test]
    fn should_default_to_empty_event_catalogue() {
        assert!(DriverConfig::default().event_catalogue().unwrap().is_empty());
    }

    #[test]
    fn should_report_missing_event_file() {
        let driver = DriverConfig {
            events_file: Some("does-not-exist.json".to_string()),
            ..DriverConfig::default()
        };
        assert!(matches!(driver.event_catalogue(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}

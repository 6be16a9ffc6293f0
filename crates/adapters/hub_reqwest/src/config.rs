//! Hub client configuration.

use serde::Deserialize;

use crate::error::HttpError;

/// Configuration for the hub REST client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubClientConfig {
    /// Hub base address, with or without scheme (e.g. `hub.local:3196`).
    pub host: String,
    /// Value of the `X-Auth-Token` header.
    pub token: String,
    /// Sent as `Authorization` on device listings and file uploads.
    pub driver_key: String,
    /// Timeout applied to every request, in seconds.
    pub timeout_secs: u64,
    /// Accept self-signed certificates.
    pub accept_invalid_certs: bool,
}

impl Default for HubClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            token: String::new(),
            driver_key: String::new(),
            timeout_secs: 10,
            accept_invalid_certs: true,
        }
    }
}

impl HubClientConfig {
    /// Base URL of the hub: `http://` is prepended when no scheme is given and
    /// a trailing `/` is removed.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::EmptyHost`] when `host` is blank.
    pub fn base_url(&self) -> Result<String, HttpError> {
        normalize_host(&self.host)
    }
}

/// See [`HubClientConfig::base_url`].
///
/// # Errors
///
/// Returns [`HttpError::EmptyHost`] when `host` is blank.
pub fn normalize_host(host: &str) -> Result<String, HttpError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(HttpError::EmptyHost);
    }
    let with_scheme = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };
    Ok(with_scheme.trim_end_matches('/').to_string())
}

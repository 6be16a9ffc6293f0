//! WebSocket URL construction from the configured hub host.

/// Path of the action channel, relative to the hub host.
pub const ACTION_CHANNEL_PATH: &str = "objects/ws";

/// Path of the configuration channel, relative to the hub host.
pub const CONFIG_CHANNEL_PATH: &str = "ws/v1/config_communication";

/// Turn a hub host into a WebSocket URL for `path`.
///
/// `https://` becomes `wss://`, `http://` becomes `ws://`, a host without a
/// scheme is treated as `ws://`. `ws://` and `wss://` are kept.
#[must_use]
pub fn to_websocket_url(host: &str, path: &str) -> String {
    let host = host.trim();
    let base = if let Some(rest) = host.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = host.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if host.starts_with("ws://") || host.starts_with("wss://") {
        host.to_string()
    } else {
        format!("ws://{host}")
    };
    let base = base.trim_end_matches('/');

    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{}", path.trim_start_matches('/'))
    }
}

/// Append `params` as a percent-encoded query string.
#[must_use]
pub fn with_query(url: &str, params: &[(&str, &str)]) -> String {
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    if query.is_empty() {
        url.to_string()
    } else {
        format!("{url}?{query}")
    }
}

/// Percent-encode everything but RFC 3986 unreserved characters.
#[must_use]
pub fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

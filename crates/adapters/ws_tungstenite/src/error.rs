//! WebSocket adapter error types.

use hublink_domain::error::HubLinkError;
use tokio_tungstenite::tungstenite;

/// Errors raised while connecting to or talking over a hub socket.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    /// Not a `ws://` or `wss://` URL with a host.
    #[error("invalid WebSocket URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid value for header {0}")]
    InvalidHeader(String),

    #[error("failed to build TLS configuration")]
    Tls(#[source] rustls::Error),

    #[error("WebSocket connect failed")]
    Connect(#[source] tungstenite::Error),

    #[error("WebSocket send failed")]
    Send(#[source] tungstenite::Error),

    #[error("WebSocket read failed")]
    Read(#[source] tungstenite::Error),

    #[error("failed to encode frame")]
    Encode(#[source] serde_json::Error),
}

impl WsError {
    /// Whether the session failed before the socket was established.
    #[must_use]
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. } | Self::InvalidHeader(_) | Self::Tls(_) | Self::Connect(_)
        )
    }

    /// Convert into a [`HubLinkError`] for propagation across port boundaries.
    pub fn into_domain(self) -> HubLinkError {
        HubLinkError::Transport(Box::new(self))
    }
}

impl From<WsError> for HubLinkError {
    fn from(err: WsError) -> Self {
        err.into_domain()
    }
}

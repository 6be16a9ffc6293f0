//! Shared WebSocket transport.
//!
//! Thin wrapper around `tokio-tungstenite` providing reader/writer halves.
//! [`connect`] builds the request, inserts headers and negotiates relaxed
//! TLS for `wss://` URLs; the returned pair is meant for `tokio::select!`
//! loops.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, tungstenite};

use crate::error::WsError;
use crate::tls;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Received WebSocket message.
#[derive(Debug, PartialEq, Eq)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    /// Close frame; code 1005 when the peer sent none.
    Close { code: u16, reason: String },
}

/// Write half of a WebSocket connection.
#[derive(Debug)]
pub struct WsWriter {
    sink: SplitSink<WsStream, Message>,
}

impl WsWriter {
    /// Send a UTF-8 text frame.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::Send`] if the connection is closed or broken.
    pub async fn send_text(&mut self, text: &str) -> Result<(), WsError> {
        self.sink
            .send(Message::Text(text.to_string()))
            .await
            .map_err(WsError::Send)
    }

    /// Serialize `value` and send it as a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::Encode`] or [`WsError::Send`].
    pub async fn send_json<T: serde::Serialize>(&mut self, value: &T) -> Result<(), WsError> {
        let text = serde_json::to_string(value).map_err(WsError::Encode)?;
        self.send_text(&text).await
    }

    /// # Errors
    ///
    /// Returns [`WsError::Send`] if the send fails.
    pub async fn send_pong(&mut self, data: Vec<u8>) -> Result<(), WsError> {
        self.sink
            .send(Message::Pong(data))
            .await
            .map_err(WsError::Send)
    }

    /// Start the close handshake.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::Send`] if the send fails.
    pub async fn send_close(&mut self) -> Result<(), WsError> {
        self.sink
            .send(Message::Close(None))
            .await
            .map_err(WsError::Send)
    }
}

/// Read half of a WebSocket connection.
#[derive(Debug)]
pub struct WsReader {
    stream: SplitStream<WsStream>,
}

impl WsReader {
    /// Receive the next message, `None` when the stream ends.
    pub async fn recv(&mut self) -> Option<Result<WsMessage, WsError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(err) => return Some(Err(WsError::Read(err))),
            };
            let message = match message {
                Message::Text(text) => WsMessage::Text(text),
                Message::Binary(data) => WsMessage::Binary(data),
                Message::Ping(data) => WsMessage::Ping(data),
                Message::Pong(data) => WsMessage::Pong(data),
                Message::Close(frame) => {
                    let (code, reason) = frame
                        .map_or((1005, String::new()), |cf| (cf.code.into(), cf.reason.to_string()));
                    WsMessage::Close { code, reason }
                }
                Message::Frame(_) => continue,
            };
            return Some(Ok(message));
        }
    }
}

/// Connect to `url`, sending each `(name, value)` header with the handshake.
///
/// # Errors
///
/// Returns an error if the URL or a header is malformed, TLS cannot be set
/// up, or the handshake fails.
pub async fn connect(url: &str, headers: &[(&str, &str)]) -> Result<(WsWriter, WsReader), WsError> {
    use tungstenite::client::IntoClientRequest;

    let invalid = |reason: String| WsError::InvalidUrl {
        url: url.to_string(),
        reason,
    };
    let mut request = url
        .into_client_request()
        .map_err(|err| invalid(err.to_string()))?;
    let uri = request.uri();
    if !matches!(uri.scheme_str(), Some("ws" | "wss")) {
        return Err(invalid("scheme must be ws or wss".to_string()));
    }
    if uri.host().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    for &(name, value) in headers {
        let header_name = tungstenite::http::HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| WsError::InvalidHeader(name.to_string()))?;
        let header_value = tungstenite::http::HeaderValue::from_str(value)
            .map_err(|_| WsError::InvalidHeader(name.to_string()))?;
        request.headers_mut().insert(header_name, header_value);
    }

    let connector = Connector::Rustls(tls::relaxed_client_config()?);
    let (ws_stream, _response) =
        tokio_tungstenite::connect_async_tls_with_config(request, None, false, Some(connector))
            .await
            .map_err(WsError::Connect)?;

    let (sink, stream) = ws_stream.split();
    Ok((WsWriter { sink }, WsReader { stream }))
}

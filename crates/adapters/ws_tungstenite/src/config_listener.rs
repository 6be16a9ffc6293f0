//! Configuration channel: answers configuration requests from the hub.
//!
//! Each inbound request runs in its own task against the shared
//! [`ConfigHandlerTable`]; responses are funnelled back through a queue and
//! written in completion order, correlated by `requestId`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use tokio::sync::mpsc;

use hublink_app::config_handlers::ConfigHandlerTable;
use hublink_domain::config::{ConfigKey, ConfigurationRequest, ConfigurationResponse, VideoEngineSetting};

use crate::error::WsError;
use crate::reconnect::SessionEnd;
use crate::transport::{self, WsMessage, WsReader};
use crate::url::{CONFIG_CHANNEL_PATH, to_websocket_url, with_query};

/// How long to wait for the hub to acknowledge a close frame.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings of the configuration channel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigChannelConfig {
    pub host: String,
    /// Sent as the `Authorization` header.
    pub driver_key: String,
    /// Sent as the `X-Auth-Token` header.
    pub token: String,
    pub site_id: String,
    pub driver_id: String,
    pub driver_version: String,
    /// Free-form driver documentation, sent base64-encoded.
    pub driver_documentation: String,
}

impl ConfigChannelConfig {
    #[must_use]
    pub fn url(&self) -> String {
        let documentation = if self.driver_documentation.is_empty() {
            String::new()
        } else {
            BASE64.encode(self.driver_documentation.as_bytes())
        };
        with_query(
            &to_websocket_url(&self.host, CONFIG_CHANNEL_PATH),
            &[
                ("site_id", self.site_id.as_str()),
                ("driver_id", self.driver_id.as_str()),
                ("driver_version", self.driver_version.as_str()),
                ("driver_documentation", documentation.as_str()),
            ],
        )
    }
}

/// Callback receiving the video engine id carried by `SAVE_VIDEO_ENGINE`.
pub type VideoEngineSetter = Arc<dyn Fn(String) + Send + Sync>;

pub struct ConfigListener {
    config: ConfigChannelConfig,
    handlers: Arc<ConfigHandlerTable>,
    video_engine_setter: Option<VideoEngineSetter>,
}

impl ConfigListener {
    #[must_use]
    pub fn new(config: ConfigChannelConfig, handlers: Arc<ConfigHandlerTable>) -> Self {
        Self {
            config,
            handlers,
            video_engine_setter: None,
        }
    }

    #[must_use]
    pub fn with_video_engine_setter(mut self, setter: VideoEngineSetter) -> Self {
        self.video_engine_setter = Some(setter);
        self
    }

    /// Serve requests until the hub closes the socket or Ctrl-C is pressed.
    ///
    /// # Errors
    ///
    /// See [`run_until`](Self::run_until).
    pub async fn run_session(&self) -> Result<SessionEnd, WsError> {
        self.run_until(async {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("cannot listen for Ctrl-C, configuration channel runs until closed");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve requests until the hub closes the socket or `shutdown`
    /// completes, in which case the close handshake is performed.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] if the connection cannot be established, a read
    /// fails, or the close frame cannot be sent.
    #[tracing::instrument(skip_all, fields(site_id = %self.config.site_id, driver_id = %self.config.driver_id))]
    pub async fn run_until<S>(&self, shutdown: S) -> Result<SessionEnd, WsError>
    where
        S: Future<Output = ()>,
    {
        let (mut writer, mut reader) = transport::connect(
            &self.config.url(),
            &[
                ("Authorization", self.config.driver_key.as_str()),
                ("X-Auth-Token", self.config.token.as_str()),
            ],
        )
        .await?;
        tracing::info!("configuration channel connected");

        let (responses_tx, mut responses_rx) = mpsc::unbounded_channel::<ConfigurationResponse>();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(response) = responses_rx.recv() => {
                    if let Err(err) = writer.send_json(&response).await {
                        tracing::warn!(request_id = %response.request_id, error = %err, "dropping configuration response");
                    }
                }
                frame = reader.recv() => match frame {
                    None => return Ok(SessionEnd::Closed),
                    Some(Err(err)) => return Err(err),
                    Some(Ok(WsMessage::Text(text))) => self.accept(&text, &responses_tx),
                    Some(Ok(WsMessage::Ping(data))) => {
                        if let Err(err) = writer.send_pong(data).await {
                            tracing::warn!(error = %err, "failed to answer ping");
                        }
                    }
                    Some(Ok(WsMessage::Close { code, reason })) => {
                        tracing::info!(code, %reason, "configuration channel closed by hub");
                        return Ok(SessionEnd::Closed);
                    }
                    Some(Ok(_)) => {}
                },
                () = &mut shutdown => {
                    tracing::info!("closing configuration channel");
                    writer.send_close().await?;
                    await_close(&mut reader).await;
                    return Ok(SessionEnd::Shutdown);
                }
            }
        }
    }

    fn accept(&self, text: &str, responses: &mpsc::UnboundedSender<ConfigurationResponse>) {
        let request: ConfigurationRequest = match serde_json::from_str(text) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed configuration frame");
                return;
            }
        };
        tracing::debug!(config_key = %request.config_key, request_id = %request.request_id, "configuration requested");

        if request.config_key == ConfigKey::SaveVideoEngine {
            self.save_video_engine(&request.value);
        }

        let handlers = Arc::clone(&self.handlers);
        let responses = responses.clone();
        tokio::spawn(async move {
            let response = handlers.handle(&request).await;
            let _ = responses.send(response);
        });
    }

    fn save_video_engine(&self, value: &str) {
        let Some(setter) = &self.video_engine_setter else {
            return;
        };
        match serde_json::from_str::<VideoEngineSetting>(value) {
            Ok(setting) => setter(setting.video_engine),
            Err(err) => tracing::warn!(error = %err, "invalid SAVE_VIDEO_ENGINE value"),
        }
    }
}

async fn await_close(reader: &mut WsReader) {
    let acknowledged = tokio::time::timeout(CLOSE_TIMEOUT, async {
        while let Some(Ok(message)) = reader.recv().await {
            if matches!(message, WsMessage::Close { .. }) {
                break;
            }
        }
    })
    .await;
    if acknowledged.is_err() {
        tracing::warn!("hub did not acknowledge close in time");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio_tungstenite::tungstenite::Message;

    use hublink_app::ports::handler_fn;
    use hublink_domain::error::HubLinkError;

    use super::*;
    use crate::test_support::TestServer;

    fn config(server: &TestServer) -> ConfigChannelConfig {
        ConfigChannelConfig {
            host: server.host(),
            driver_key: "drv-key".to_string(),
            token: "tok".to_string(),
            site_id: "site-1".to_string(),
            driver_id: "42".to_string(),
            driver_version: "1.0.0".to_string(),
            driver_documentation: String::new(),
        }
    }

    fn ping_table() -> Arc<ConfigHandlerTable> {
        Arc::new(ConfigHandlerTable::new().with(
            ConfigKey::ActionPingDevice,
            handler_fn(|_, _| async { Ok::<_, HubLinkError>(String::new()) }),
        ))
    }

    #[test]
    fn should_build_url_with_encoded_documentation() {
        let config = ConfigChannelConfig {
            host: "https://hub.example.com/".to_string(),
            site_id: "s1".to_string(),
            driver_id: "d1".to_string(),
            driver_version: "2.1".to_string(),
            driver_documentation: "hi?".to_string(),
            ..ConfigChannelConfig::default()
        };
        assert_eq!(
            config.url(),
            "wss://hub.example.com/ws/v1/config_communication?site_id=s1&driver_id=d1&driver_version=2.1&driver_documentation=aGk%2F"
        );
    }

    #[test]
    fn should_send_empty_documentation_when_none() {
        let config = ConfigChannelConfig {
            host: "hub".to_string(),
            ..ConfigChannelConfig::default()
        };
        assert!(config.url().ends_with("&driver_documentation="));
    }

    #[tokio::test]
    async fn should_answer_each_request_by_request_id() {
        let server = TestServer::start(|mut socket| async move {
            for (key, id) in [("actionPingDevice", "r-1"), ("fooBar", "r-2")] {
                let request = json!({"configKey": key, "value": "", "requestId": id});
                socket.send(Message::Text(request.to_string())).await.unwrap();
            }

            let mut answers = HashMap::new();
            while answers.len() < 2 {
                let frame = socket.next().await.unwrap().unwrap();
                let response: ConfigurationResponse = serde_json::from_str(frame.to_text().unwrap()).unwrap();
                answers.insert(response.request_id.to_string(), response.data);
            }
            assert_eq!(answers["r-1"], r#"{"error":false,"msg":"OK"}"#);
            assert_eq!(answers["r-2"], r#"{"error":true,"msg":"'fooBar' not found on the driver"}"#);
            socket.close(None).await.unwrap();
        })
        .await;

        let listener = ConfigListener::new(config(&server), ping_table());
        let end = listener.run_until(std::future::pending()).await.unwrap();

        assert_eq!(end, SessionEnd::Closed);
        let handshake = server.handshake();
        assert_eq!(handshake.headers.get("authorization").map(String::as_str), Some("drv-key"));
        assert_eq!(handshake.headers.get("x-auth-token").map(String::as_str), Some("tok"));
        assert!(handshake
            .path_and_query
            .starts_with("/ws/v1/config_communication?site_id=site-1&driver_id=42"));
        server.finished().await;
    }

    #[tokio::test]
    async fn should_pass_video_engine_to_setter_and_still_answer() {
        let server = TestServer::start(|mut socket| async move {
            let request = json!({
                "configKey": "SAVE_VIDEO_ENGINE",
                "value": r#"{"video_engine":"ve-7"}"#,
                "requestId": "r-9"
            });
            socket.send(Message::Text(request.to_string())).await.unwrap();
            let frame = socket.next().await.unwrap().unwrap();
            let response: ConfigurationResponse = serde_json::from_str(frame.to_text().unwrap()).unwrap();
            assert_eq!(response.request_id.as_str(), "r-9");
            assert_eq!(
                response.data,
                r#"{"error":true,"msg":"'SAVE_VIDEO_ENGINE' not found on the driver"}"#
            );
            socket.close(None).await.unwrap();
        })
        .await;

        let saved = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&saved);
        let listener = ConfigListener::new(config(&server), ping_table())
            .with_video_engine_setter(Arc::new(move |id: String| *sink.lock().unwrap() = Some(id)));

        listener.run_until(std::future::pending()).await.unwrap();

        assert_eq!(saved.lock().unwrap().as_deref(), Some("ve-7"));
        server.finished().await;
    }

    #[tokio::test]
    async fn should_skip_malformed_request() {
        let server = TestServer::start(|mut socket| async move {
            socket.send(Message::Text("{".to_string())).await.unwrap();
            let request = json!({"configKey": "actionPingDevice", "requestId": "r-3"});
            socket.send(Message::Text(request.to_string())).await.unwrap();
            let frame = socket.next().await.unwrap().unwrap();
            let response: ConfigurationResponse = serde_json::from_str(frame.to_text().unwrap()).unwrap();
            assert_eq!(response.request_id.as_str(), "r-3");
            socket.close(None).await.unwrap();
        })
        .await;

        let listener = ConfigListener::new(config(&server), ping_table());
        assert_eq!(
            listener.run_until(std::future::pending()).await.unwrap(),
            SessionEnd::Closed
        );
        server.finished().await;
    }

    #[tokio::test]
    async fn should_close_handshake_on_shutdown() {
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server = TestServer::start(|mut socket| async move {
            let _ = shutdown_tx.send(());
            let frame = socket.next().await.unwrap().unwrap();
            assert!(frame.is_close());
            // Drain until the close reply has been flushed.
            while socket.next().await.is_some() {}
        })
        .await;

        let listener = ConfigListener::new(config(&server), ping_table());
        let end = listener
            .run_until(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();

        assert_eq!(end, SessionEnd::Shutdown);
        server.finished().await;
    }
}

//! In-process WebSocket server for socket tests.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

/// What the client sent with its upgrade request.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    pub path_and_query: String,
    pub headers: HashMap<String, String>,
}

pub struct TestServer {
    addr: SocketAddr,
    handshake: Arc<Mutex<Option<Handshake>>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Accept a single connection and hand the socket to `handler`.
    pub async fn start<F, Fut>(handler: F) -> Self
    where
        F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handshake = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&handshake);

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let socket = tokio_tungstenite::accept_hdr_async(
                stream,
                move |request: &Request, response: Response| {
                    let headers = request
                        .headers()
                        .iter()
                        .map(|(name, value)| {
                            (
                                name.as_str().to_string(),
                                value.to_str().unwrap_or_default().to_string(),
                            )
                        })
                        .collect();
                    *captured.lock().unwrap() = Some(Handshake {
                        path_and_query: request.uri().to_string(),
                        headers,
                    });
                    Ok::<_, ErrorResponse>(response)
                },
            )
            .await
            .unwrap();
            handler(socket).await;
        });

        Self {
            addr,
            handshake,
            handle,
        }
    }

    /// An address nothing listens on.
    pub async fn unused_address() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn url(&self, path: &str) -> String {
        format!("ws://{}/{path}", self.addr)
    }

    pub fn handshake(&self) -> Handshake {
        self.handshake.lock().unwrap().clone().unwrap_or_default()
    }

    /// Wait for the handler to return, surfacing its panics.
    pub async fn finished(self) {
        self.handle.await.unwrap();
    }
}

//! WebSocket transport
//!
//! ```text
//! start(url, headers)
//!   ├─ rewrite http(s) -> ws(s), apply headers, connect
//!   ├─ write half ──> kept for send() / stop()
//!   └─ read half  ──> reader task
//!                      ├─ Text frame   ──> on_receive(payload).await
//!                      └─ Close / error ──> on_close(reason).await
//! ```

use crate::error::{HubError, Result};
use crate::headers::Headers;
use crate::traits::transport::{CloseCallback, ReceiveCallback, Transport};
use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Map an HTTP(S) hub URL onto its WebSocket equivalent
pub fn to_websocket_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        url.to_string()
    }
}

/// `tokio-tungstenite` implementation of [`Transport`]
pub struct WebSocketTransport {
    writer: tokio::sync::Mutex<Option<WsSink>>,
    on_receive: RwLock<Option<ReceiveCallback>>,
    on_close: RwLock<Option<CloseCallback>>,
    /// Set by `stop()` so the reader reports an orderly close
    stop_requested: Arc<AtomicBool>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self {
            writer: tokio::sync::Mutex::new(None),
            on_receive: RwLock::new(None),
            on_close: RwLock::new(None),
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn start(&self, url: &str, headers: &Headers) -> Result<()> {
        let ws_url = to_websocket_url(url);
        debug!("Starting WebSocket transport to {}", ws_url);

        let mut request = ws_url
            .as_str()
            .into_client_request()
            .map_err(|e| HubError::WebSocket(format!("Invalid WebSocket url '{}': {}", ws_url, e)))?;

        for (key, value) in headers {
            match key.parse::<http::header::HeaderName>() {
                Ok(header_name) => match value.parse::<http::header::HeaderValue>() {
                    Ok(header_value) => {
                        request.headers_mut().insert(header_name, header_value);
                    }
                    Err(_) => {
                        warn!("Invalid header value for key '{}': {}", key, value);
                    }
                },
                Err(_) => {
                    warn!("Invalid header name: {}", key);
                }
            }
        }

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| HubError::WebSocket(format!("Failed to connect to {}: {}", ws_url, e)))?;
        info!("WebSocket connected to {}", ws_url);

        let (write, mut read) = ws_stream.split();
        *self.writer.lock().await = Some(write);
        self.stop_requested.store(false, Ordering::Release);

        let on_receive = self.on_receive.read().clone();
        let on_close = self.on_close.read().clone();
        let stop_requested = Arc::clone(&self.stop_requested);

        tokio::spawn(async move {
            let mut reason: Option<String> = None;
            let mut closed = false;

            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if let Some(callback) = &on_receive {
                            callback(text).await;
                        }
                    }
                    Ok(Message::Binary(_)) => {
                        warn!("Ignoring binary frame on a text transport");
                    }
                    Ok(Message::Close(frame)) => {
                        if let Some(frame) = frame {
                            if frame.code != CloseCode::Normal {
                                reason = Some(format!(
                                    "WebSocket closed with status code {} ({})",
                                    u16::from(frame.code),
                                    frame.reason
                                ));
                            }
                        }
                        closed = true;
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        reason = Some(e.to_string());
                        closed = true;
                        break;
                    }
                }
            }

            if !closed && reason.is_none() {
                reason = Some("WebSocket stream ended unexpectedly".to_string());
            }
            if stop_requested.load(Ordering::Acquire) {
                reason = None;
            }

            debug!("WebSocket reader exiting (reason: {:?})", reason);
            if let Some(callback) = on_close {
                callback(reason).await;
            }
        });

        Ok(())
    }

    async fn send(&self, message: String) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let sink = writer
            .as_mut()
            .ok_or_else(|| HubError::Transport("WebSocket is not connected".to_string()))?;
        sink.send(Message::Text(message))
            .await
            .map_err(|e| HubError::WebSocket(format!("Failed to send message: {}", e)))
    }

    fn set_on_receive(&self, callback: ReceiveCallback) {
        *self.on_receive.write() = Some(callback);
    }

    fn set_on_close(&self, callback: CloseCallback) {
        *self.on_close.write() = Some(callback);
    }

    async fn stop(&self) -> Result<()> {
        self.stop_requested.store(true, Ordering::Release);
        let sink = self.writer.lock().await.take();
        if let Some(mut sink) = sink {
            if let Err(e) = sink.close().await {
                debug!("Error closing WebSocket: {}", e);
            }
            debug!("WebSocket transport stopped");
        }
        Ok(())
    }
}

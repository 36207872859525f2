//! Common test utilities for HubSockets integration tests
//!
//! - `MockTransport`: in-memory transport that records sent frames and
//!   injects received payloads
//! - `TestHttpClient`: scripted negotiate responses keyed by URL
//! - `MockHubServer`: real WebSocket server speaking the hub protocol

#![allow(dead_code)]

use async_trait::async_trait;
use hubsockets::{
    CloseCallback, Headers, HttpClient, HttpRequest, HttpResponse, HubConnection, HubError, ReceiveCallback, Result,
    Transport,
};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};

/// Record separator
pub const RS: &str = "\u{1e}";

pub const PING: &str = "{\"type\":6}\u{1e}";

pub const HANDSHAKE_REQUEST: &str = "{\"protocol\":\"json\",\"version\":1}\u{1e}";

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// In-memory transport driven by the test
pub struct MockTransport {
    auto_handshake: bool,
    ignore_pings: bool,
    sent_tx: mpsc::UnboundedSender<String>,
    sent_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
    sent_log: Mutex<Vec<String>>,
    on_receive: Mutex<Option<ReceiveCallback>>,
    on_close: Mutex<Option<CloseCallback>>,
    url: Mutex<Option<String>>,
    headers: Mutex<Headers>,
    start_count: AtomicUsize,
    stop_count: AtomicUsize,
    fail_start: Mutex<Option<HubError>>,
}

impl MockTransport {
    /// Answers the handshake automatically and hides pings from `next_sent`
    pub fn new() -> Arc<Self> {
        Self::with_options(true, true)
    }

    pub fn with_options(auto_handshake: bool, ignore_pings: bool) -> Arc<Self> {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            auto_handshake,
            ignore_pings,
            sent_tx,
            sent_rx: tokio::sync::Mutex::new(sent_rx),
            sent_log: Mutex::new(Vec::new()),
            on_receive: Mutex::new(None),
            on_close: Mutex::new(None),
            url: Mutex::new(None),
            headers: Mutex::new(Headers::new()),
            start_count: AtomicUsize::new(0),
            stop_count: AtomicUsize::new(0),
            fail_start: Mutex::new(None),
        })
    }

    /// Make the next `start()` fail with `error`
    pub fn fail_next_start(&self, error: HubError) {
        *self.fail_start.lock() = Some(error);
    }

    /// Deliver a payload to the connection and wait until it was processed
    pub async fn receive_message(&self, payload: &str) {
        let callback = self.on_receive.lock().clone();
        match callback {
            Some(callback) => callback(payload.to_string()).await,
            None => panic!("receive_message called before a receive callback was installed"),
        }
    }

    /// Close the transport from the "server" side
    pub async fn simulate_close(&self, reason: Option<&str>) {
        let callback = self.on_close.lock().clone();
        if let Some(callback) = callback {
            callback(reason.map(str::to_string)).await;
        }
    }

    /// Next frame sent by the connection, skipping pings when configured
    pub async fn next_sent(&self) -> String {
        let mut rx = self.sent_rx.lock().await;
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("timed out waiting for a sent frame")
                .expect("sent channel closed");
            if self.ignore_pings && frame == PING {
                continue;
            }
            return frame;
        }
    }

    /// Assert nothing (except pings, when ignored) is sent within `wait`
    pub async fn assert_nothing_sent(&self, wait: Duration) {
        let mut rx = self.sent_rx.lock().await;
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Err(_) => return,
                Ok(Some(frame)) if self.ignore_pings && frame == PING => continue,
                Ok(frame) => panic!("unexpected frame sent: {:?}", frame),
            }
        }
    }

    /// Every frame sent so far, pings included
    pub fn sent_messages(&self) -> Vec<String> {
        self.sent_log.lock().clone()
    }

    pub fn url(&self) -> Option<String> {
        self.url.lock().clone()
    }

    pub fn headers(&self) -> Headers {
        self.headers.lock().clone()
    }

    pub fn start_count(&self) -> usize {
        self.start_count.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn start(&self, url: &str, headers: &Headers) -> Result<()> {
        self.start_count.fetch_add(1, Ordering::SeqCst);
        *self.url.lock() = Some(url.to_string());
        *self.headers.lock() = headers.clone();
        if let Some(error) = self.fail_start.lock().take() {
            return Err(error);
        }
        Ok(())
    }

    async fn send(&self, message: String) -> Result<()> {
        self.sent_log.lock().push(message.clone());
        let _ = self.sent_tx.send(message.clone());

        if self.auto_handshake && message == HANDSHAKE_REQUEST {
            self.receive_message(&format!("{{}}{}", RS)).await;
        }
        Ok(())
    }

    fn set_on_receive(&self, callback: ReceiveCallback) {
        *self.on_receive.lock() = Some(callback);
    }

    fn set_on_close(&self, callback: CloseCallback) {
        *self.on_close.lock() = Some(callback);
    }

    async fn stop(&self) -> Result<()> {
        self.stop_count.fetch_add(1, Ordering::SeqCst);
        self.simulate_close(None).await;
        Ok(())
    }
}

type PostHandler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync>;

/// HTTP client answering from scripted handlers
#[derive(Default)]
pub struct TestHttpClient {
    handlers: Mutex<Vec<(Option<String>, Arc<PostHandler>)>>,
    requests: Mutex<Vec<(String, HttpRequest)>>,
}

impl TestHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer POSTs to `url`; later handlers for the same URL win
    pub fn on_post<F>(&self, url: &str, handler: F)
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .push((Some(url.to_string()), Arc::new(Box::new(handler))));
    }

    /// Answer POSTs to any URL without a specific handler
    pub fn on_any_post<F>(&self, handler: F)
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        self.handlers.lock().push((None, Arc::new(Box::new(handler))));
    }

    pub fn requests(&self) -> Vec<(String, HttpRequest)> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpClient for TestHttpClient {
    async fn post(&self, url: &str, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push((url.to_string(), request.clone()));

        let handler = {
            let handlers = self.handlers.lock();
            handlers
                .iter()
                .rev()
                .find(|(pattern, _)| pattern.as_deref() == Some(url))
                .or_else(|| handlers.iter().rev().find(|(pattern, _)| pattern.is_none()))
                .map(|(_, handler)| Arc::clone(handler))
        };

        match handler {
            Some(handler) => handler(&request),
            None => Err(HubError::Negotiate(format!("No handler for POST {}", url))),
        }
    }
}

/// Negotiate body offering WebSockets
pub fn negotiate_body(connection_id: &str) -> String {
    format!(
        "{{\"connectionId\":\"{}\",\"availableTransports\":[{{\"transport\":\"WebSockets\",\"transferFormats\":[\"Text\",\"Binary\"]}}]}}",
        connection_id
    )
}

/// Connection over `transport` that skips negotiation
pub fn connection_with(transport: &Arc<MockTransport>) -> HubConnection {
    HubConnection::builder()
        .url("http://example.com")
        .transport(Arc::clone(transport) as Arc<dyn Transport>)
        .skip_negotiate(true)
        .build()
        .unwrap()
}

/// Connection over `transport` negotiating through `http`
pub fn negotiating_connection(
    url: &str,
    transport: &Arc<MockTransport>,
    http: &Arc<TestHttpClient>,
) -> HubConnection {
    HubConnection::builder()
        .url(url)
        .transport(Arc::clone(transport) as Arc<dyn Transport>)
        .http_client(Arc::clone(http) as Arc<dyn HttpClient>)
        .build()
        .unwrap()
}

/// Minimal hub server over a real WebSocket
///
/// Answers the handshake, completes every invocation carrying an id with
/// its first argument and echoes fire-and-forget invocations back.
pub struct MockHubServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
}

impl MockHubServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let shutdown = shutdown_clone.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, shutdown).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self { addr, shutdown }
    }

    async fn handle_connection(stream: tokio::net::TcpStream, shutdown: Arc<Notify>) {
        use futures::{SinkExt, StreamExt};
        use serde_json::{json, Value};
        use tokio_tungstenite::accept_async;
        use tokio_tungstenite::tungstenite::Message;

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();
        let mut handshake_done = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    let text = match msg {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => continue,
                    };

                    let mut replies = Vec::new();
                    for frame in text.split(RS).filter(|f| !f.is_empty()) {
                        if !handshake_done {
                            handshake_done = true;
                            replies.push(format!("{{}}{}", RS));
                            continue;
                        }

                        let Ok(message) = serde_json::from_str::<Value>(frame) else {
                            continue;
                        };
                        if message["type"] != json!(1) {
                            continue;
                        }

                        let first = message["arguments"].get(0).cloned().unwrap_or(Value::Null);
                        let reply = match message.get("invocationId") {
                            Some(id) => json!({"type": 3, "invocationId": id, "result": first}),
                            None => json!({"type": 1, "target": message["target"], "arguments": message["arguments"]}),
                        };
                        replies.push(format!("{}{}", reply, RS));
                    }

                    for reply in replies {
                        if write.send(Message::Text(reply)).await.is_err() {
                            return;
                        }
                    }
                }
                _ = shutdown.notified() => {
                    let _ = write.send(Message::Text(format!("{{\"type\":7}}{}", RS))).await;
                    break;
                }
            }
        }
    }

    /// Hub URL for this server (http scheme, rewritten by the transport)
    pub fn url(&self) -> String {
        format!("http://{}/hub", self.addr)
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockHubServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

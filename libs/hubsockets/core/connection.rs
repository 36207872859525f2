//! Hub connection engine
//!
//! # Lifecycle
//!
//! ```text
//!                start()
//!   Disconnected ───────> token ─> negotiate ─> transport.start ─> handshake
//!        ^                                                            │
//!        │  stop() / Close message / server timeout / transport close │ ack
//!        └──────────────────────────── Connected <────────────────────┘
//! ```
//!
//! While connected three tasks run next to the caller:
//!
//! - **Reader** (owned by the transport): feeds payloads to the message pump
//! - **Writer**: drains the outbound queue into `transport.send` in order
//! - **Keep-alive supervisor**: sends pings and detects a silent server
//!
//! Every way of leaving `Connected` converges on one teardown path, which
//! resolves outstanding invocations and runs the close callbacks exactly once.

use super::callbacks::{CallbackMap, HandlerAction, Subscription};
use super::config::ConnectionConfig;
use super::connection_state::ConnectionState;
use super::deadlines::{KeepAliveAction, KeepAliveDeadlines};
use super::heartbeat::{spawn_keep_alive, KeepAliveHandle, TickOutcome};
use super::invocations::{InvocationRegistry, InvocationRequest, SingleReceiver, StreamReceiver};
use super::negotiate;
use crate::auth::AccessTokenProvider;
use crate::error::{HubError, Result};
use crate::headers::{set_bearer_token, Headers};
use crate::http::HttpClient;
use crate::protocol::handshake::{self, split_handshake};
use crate::protocol::{
    bind_arguments, to_arguments, ArgType, CancelInvocationMessage, HubArgs, HubMessage, HubProtocol,
    InvocationMessage, JsonHubProtocol, StreamInvocationMessage,
};
use crate::traits::transport::{Transport, TransportFactory};
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::Stream;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Callback run once per transition to `Disconnected`
///
/// Receives `None` after an orderly `stop()` and the cause otherwise.
pub type ClosedCallback = Arc<dyn Fn(Option<HubError>) + Send + Sync>;

type StartAttempt = Shared<BoxFuture<'static, Result<()>>>;

/// Everything the builder hands over to the engine
pub(crate) struct ConnectionParts {
    pub base_url: String,
    pub transport: Option<Arc<dyn Transport>>,
    pub transport_factory: Option<TransportFactory>,
    pub http_client: Arc<dyn HttpClient>,
    pub token_provider: Option<Arc<dyn AccessTokenProvider>>,
    pub headers: Headers,
    pub config: ConnectionConfig,
}

/// State guarded by the engine lock
///
/// The lock is never held across an await.
#[derive(Default)]
struct EngineState {
    state: ConnectionState,
    /// First error recorded by a stop, reported in preference to the transport's reason
    stop_error: Option<HubError>,
    transport: Option<Arc<dyn Transport>>,
    invocations: Option<Arc<InvocationRegistry>>,
    outbound: Option<mpsc::UnboundedSender<String>>,
    keep_alive: Option<KeepAliveHandle>,
    handshake: Option<oneshot::Sender<Result<()>>>,
    handshake_received: bool,
    /// Bumped on every start and teardown; transport events from another
    /// generation are ignored
    generation: u64,
}

struct ConnectionInner {
    base_url: String,
    protocol: Box<dyn HubProtocol>,
    configured_transport: Option<Arc<dyn Transport>>,
    transport_factory: Option<TransportFactory>,
    http_client: Arc<dyn HttpClient>,
    token_provider: Option<Arc<dyn AccessTokenProvider>>,
    headers: Mutex<Headers>,
    config: RwLock<ConnectionConfig>,
    engine: Mutex<EngineState>,
    callbacks: Arc<CallbackMap>,
    closed_callbacks: RwLock<Vec<ClosedCallback>>,
    deadlines: Arc<KeepAliveDeadlines>,
    /// Serializes the message pump
    receive_lock: tokio::sync::Mutex<()>,
    starting: Mutex<Option<StartAttempt>>,
}

/// Client side of a hub connection
///
/// Cheap to clone; all clones drive the same connection.
#[derive(Clone)]
pub struct HubConnection {
    inner: Arc<ConnectionInner>,
}

impl HubConnection {
    pub(crate) fn from_parts(parts: ConnectionParts) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                base_url: parts.base_url,
                protocol: Box::new(JsonHubProtocol::new()),
                configured_transport: parts.transport,
                transport_factory: parts.transport_factory,
                http_client: parts.http_client,
                token_provider: parts.token_provider,
                headers: Mutex::new(parts.headers),
                config: RwLock::new(parts.config),
                engine: Mutex::new(EngineState::default()),
                callbacks: Arc::new(CallbackMap::new()),
                closed_callbacks: RwLock::new(Vec::new()),
                deadlines: Arc::new(KeepAliveDeadlines::new()),
                receive_lock: tokio::sync::Mutex::new(()),
                starting: Mutex::new(None),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.engine.lock().state
    }

    /// Connect, negotiate and complete the handshake
    ///
    /// Returns immediately when already connected. Concurrent callers share
    /// the outcome of a single attempt.
    pub async fn start(&self) -> Result<()> {
        if self.connection_state().is_connected() {
            return Ok(());
        }

        let attempt = {
            let mut starting = self.inner.starting.lock();
            match starting.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let inner = Arc::clone(&self.inner);
                    let handle = tokio::spawn(async move {
                        let result = inner.run_start().await;
                        *inner.starting.lock() = None;
                        result
                    });
                    let attempt = async move {
                        handle
                            .await
                            .unwrap_or_else(|e| Err(HubError::Transport(format!("Start task failed: {}", e))))
                    }
                    .boxed()
                    .shared();
                    *starting = Some(attempt.clone());
                    attempt
                }
            }
        };

        attempt.await
    }

    /// Orderly stop; outstanding invocations are canceled
    pub async fn stop(&self) -> Result<()> {
        self.inner.stop_with(None).await
    }

    /// Fire-and-forget invocation of a hub method
    pub fn send<A: Serialize>(&self, method: &str, args: A) -> Result<()> {
        self.inner.ensure_connected("send")?;
        let message = HubMessage::Invocation(InvocationMessage {
            invocation_id: None,
            target: method.to_string(),
            arguments: to_arguments(args)?,
        });
        self.inner.send_hub_message(&message, "send")
    }

    /// Invoke a hub method and await its single result
    ///
    /// Fails synchronously when disconnected; the returned future resolves
    /// with the decoded result, a [`HubError::Remote`] or a cancellation.
    pub fn invoke<T: DeserializeOwned>(
        &self,
        method: &str,
        args: impl Serialize,
    ) -> Result<PendingInvocation<T>> {
        let registry = self.inner.active_registry("invoke")?;
        let arguments = to_arguments(args)?;

        let invocation_id = registry.next_id();
        let (request, receiver) = InvocationRequest::single(invocation_id.clone());
        registry.add(request)?;

        let message = HubMessage::Invocation(InvocationMessage {
            invocation_id: Some(invocation_id.clone()),
            target: method.to_string(),
            arguments,
        });
        if let Err(e) = self.inner.send_hub_message(&message, "invoke") {
            registry.remove(&invocation_id);
            return Err(e);
        }

        debug!(invocation_id = %invocation_id, target = method, "Invocation sent");
        Ok(PendingInvocation {
            invocation_id,
            receiver,
            _result: PhantomData,
        })
    }

    /// Invoke a streaming hub method
    ///
    /// Dropping the returned stream before it finishes cancels the
    /// invocation on the server.
    pub fn stream<T: DeserializeOwned>(&self, method: &str, args: impl Serialize) -> Result<HubStream<T>> {
        let registry = self.inner.active_registry("stream")?;
        let arguments = to_arguments(args)?;

        let invocation_id = registry.next_id();
        let (request, receiver) = InvocationRequest::stream(invocation_id.clone());
        registry.add(request)?;

        let message = HubMessage::StreamInvocation(StreamInvocationMessage {
            invocation_id: invocation_id.clone(),
            target: method.to_string(),
            arguments,
        });
        if let Err(e) = self.inner.send_hub_message(&message, "stream") {
            registry.remove(&invocation_id);
            return Err(e);
        }

        debug!(invocation_id = %invocation_id, target = method, "Stream invocation sent");
        Ok(HubStream {
            invocation_id,
            receiver,
            connection: Arc::downgrade(&self.inner),
            finished: false,
            _item: PhantomData,
        })
    }

    /// Register a typed handler for a client method
    ///
    /// `A` is a tuple of the expected argument types, e.g. `(String, i32)`.
    pub fn on<A, F>(&self, target: &str, handler: F) -> Subscription
    where
        A: HubArgs,
        F: Fn(A) + Send + Sync + 'static,
    {
        let target_name = target.to_string();
        let action: HandlerAction = Arc::new(move |arguments: &[Value]| match A::from_arguments(arguments) {
            Ok(args) => handler(args),
            Err(e) => error!("Failed to bind arguments for '{}': {}", target_name, e),
        });
        self.inner.callbacks.put(target, A::arg_types(), action)
    }

    /// Register a handler receiving the raw JSON arguments
    pub fn on_raw<F>(&self, target: &str, arg_types: Vec<ArgType>, handler: F) -> Subscription
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.inner.callbacks.put(target, arg_types, Arc::new(handler))
    }

    /// Remove every handler registered for `target`
    pub fn remove(&self, target: &str) {
        self.inner.callbacks.remove(target);
    }

    /// Register a callback run every time the connection closes
    pub fn on_closed<F>(&self, callback: F)
    where
        F: Fn(Option<HubError>) + Send + Sync + 'static,
    {
        self.inner.closed_callbacks.write().push(Arc::new(callback));
    }

    pub fn server_timeout(&self) -> Duration {
        self.inner.config.read().server_timeout
    }

    pub fn set_server_timeout(&self, timeout: Duration) {
        self.inner.config.write().server_timeout = timeout;
    }

    pub fn keep_alive_interval(&self) -> Duration {
        self.inner.config.read().keep_alive_interval
    }

    pub fn set_keep_alive_interval(&self, interval: Duration) {
        self.inner.config.write().keep_alive_interval = interval;
    }

    /// Applies from the next start
    #[doc(hidden)]
    pub fn set_tick_rate(&self, tick_rate: Duration) {
        self.inner.config.write().tick_rate = tick_rate;
    }

    pub fn handshake_timeout(&self) -> Duration {
        self.inner.config.read().handshake_timeout
    }

    pub fn set_handshake_timeout(&self, timeout: Duration) {
        self.inner.config.write().handshake_timeout = timeout;
    }
}

impl ConnectionInner {
    async fn run_start(self: &Arc<Self>) -> Result<()> {
        debug!("Starting HubConnection");

        if let Some(provider) = &self.token_provider {
            let token = provider.access_token().await?;
            set_bearer_token(&mut self.headers.lock(), &token);
        }

        self.engine.lock().stop_error = None;

        let config = self.config.read().clone();
        let headers = self.headers.lock().clone();
        let (url, headers) = if config.skip_negotiate {
            (self.base_url.clone(), headers)
        } else {
            let (url, headers) = negotiate::resolve(self.http_client.as_ref(), &self.base_url, headers).await?;
            *self.headers.lock() = headers.clone();
            (url, headers)
        };

        let transport = self.create_transport();
        let (handshake_tx, handshake_rx) = oneshot::channel();
        {
            let mut engine = self.engine.lock();
            engine.generation += 1;
            self.install_transport_callbacks(&transport, engine.generation);
            engine.transport = Some(Arc::clone(&transport));
            engine.handshake = Some(handshake_tx);
            engine.handshake_received = false;
        }

        match self
            .open_and_handshake(&transport, &url, &headers, handshake_rx, config.handshake_timeout)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("HubConnection failed to start: {}", e);
                {
                    let mut engine = self.engine.lock();
                    engine.handshake = None;
                    engine.transport = None;
                }
                if let Err(stop_err) = transport.stop().await {
                    debug!("Error stopping transport after failed start: {}", stop_err);
                }
                Err(e)
            }
        }
    }

    async fn open_and_handshake(
        &self,
        transport: &Arc<dyn Transport>,
        url: &str,
        headers: &Headers,
        mut handshake_rx: oneshot::Receiver<Result<()>>,
        handshake_timeout: Duration,
    ) -> Result<()> {
        transport.start(url, headers).await?;

        let request = handshake::build_request(self.protocol.name(), self.protocol.version())?;
        transport.send(request).await?;

        match tokio::time::timeout(handshake_timeout, &mut handshake_rx).await {
            Ok(outcome) => outcome.unwrap_or_else(|_| Err(closed_during_handshake())),
            Err(_) => {
                let still_pending = self.engine.lock().handshake.take().is_some();
                if still_pending {
                    Err(HubError::HandshakeTimeout)
                } else {
                    // The pump resolved the handshake as the timer fired
                    handshake_rx.await.unwrap_or_else(|_| Err(closed_during_handshake()))
                }
            }
        }
    }

    fn create_transport(&self) -> Arc<dyn Transport> {
        if let Some(transport) = &self.configured_transport {
            return Arc::clone(transport);
        }
        if let Some(factory) = &self.transport_factory {
            return factory();
        }
        Arc::new(crate::transport::WebSocketTransport::new())
    }

    fn install_transport_callbacks(self: &Arc<Self>, transport: &Arc<dyn Transport>, generation: u64) {
        let weak = Arc::downgrade(self);
        transport.set_on_receive(Arc::new(move |payload: String| {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    if inner.is_current(generation) {
                        inner.process_payload(payload).await;
                    }
                }
            }
            .boxed()
        }));

        let weak = Arc::downgrade(self);
        transport.set_on_close(Arc::new(move |reason: Option<String>| {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    if inner.is_current(generation) {
                        inner.on_transport_closed(reason);
                    } else {
                        debug!("Ignoring close of a previous transport");
                    }
                }
            }
            .boxed()
        }));
    }

    fn is_current(&self, generation: u64) -> bool {
        self.engine.lock().generation == generation
    }

    async fn process_payload(self: &Arc<Self>, payload: String) {
        let _pump = self.receive_lock.lock().await;

        let server_timeout = self.config.read().server_timeout;
        self.deadlines.reset_server_timeout(server_timeout);

        let handshake_received = {
            let engine = self.engine.lock();
            if engine.handshake_received && engine.state.is_disconnected() {
                debug!("Dropping payload received after the connection closed");
                return;
            }
            engine.handshake_received
        };
        let messages_payload = if handshake_received {
            payload.as_str()
        } else {
            let (frame, rest) = split_handshake(&payload);
            match parse_handshake(frame) {
                Ok(()) => {
                    if !self.complete_handshake() {
                        debug!("Dropping payload received without a pending handshake");
                        return;
                    }
                }
                Err(e) => {
                    self.fail_handshake(e);
                    return;
                }
            }
            rest
        };

        if messages_payload.is_empty() {
            return;
        }

        for decoded in self.protocol.parse_messages(messages_payload, self.callbacks.as_ref()) {
            match decoded {
                Ok(message) => self.dispatch(message).await,
                Err(e) => error!("Dropping undecodable message: {}", e),
            }
        }
    }

    async fn dispatch(self: &Arc<Self>, message: HubMessage) {
        let message_type = message.message_type();
        debug!("Received {} message", message_type);

        match message {
            HubMessage::Invocation(invocation) => {
                let Some(handlers) = self.callbacks.get(&invocation.target) else {
                    warn!("Failed to find handler for '{}' method.", invocation.target);
                    return;
                };
                for handler in handlers {
                    if let Err(cause) = bind_arguments(&invocation.target, &invocation.arguments, handler.arg_types())
                    {
                        error!("Skipping handler for '{}': {}", invocation.target, cause);
                        continue;
                    }
                    handler.invoke(&invocation.arguments);
                }
            }
            HubMessage::Close(close) => {
                info!("Received Close message from the server");
                let error = close.error.map(HubError::ConnectionClosed);
                if let Err(e) = self.stop_with(error).await {
                    debug!("Error stopping transport after Close message: {}", e);
                }
            }
            HubMessage::Ping => {}
            HubMessage::Completion(completion) => {
                let request = self
                    .active_invocations()
                    .and_then(|registry| registry.remove(&completion.invocation_id));
                match request {
                    Some(request) => request.complete(completion),
                    None => warn!(
                        "Dropped unsolicited Completion message for invocation '{}'.",
                        completion.invocation_id
                    ),
                }
            }
            HubMessage::StreamItem(item) => {
                let request = self
                    .active_invocations()
                    .and_then(|registry| registry.get(&item.invocation_id));
                match request {
                    Some(request) => request.add_item(item.item),
                    None => warn!(
                        "Dropped unsolicited StreamItem message for invocation '{}'.",
                        item.invocation_id
                    ),
                }
            }
            HubMessage::StreamInvocation(_) | HubMessage::CancelInvocation(_) => {
                error!(
                    "{}",
                    HubError::UnsupportedMessage(format!(
                        "{} messages are not supported by the client",
                        message_type
                    ))
                );
            }
            HubMessage::InvocationBindingFailure(failure) => {
                error!(
                    "Failed to bind arguments for invocation of '{}': {}",
                    failure.target, failure.cause
                );
            }
        }
    }

    /// Transition to `Connected` once the handshake ack arrived
    ///
    /// Returns `false` when no start is waiting for it.
    fn complete_handshake(self: &Arc<Self>) -> bool {
        let config = self.config.read().clone();
        let mut engine = self.engine.lock();

        let Some(waiter) = engine.handshake.take() else {
            return false;
        };
        let Some(transport) = engine.transport.clone() else {
            let _ = waiter.send(Err(closed_during_handshake()));
            return false;
        };

        engine.handshake_received = true;
        engine.state = ConnectionState::Connected;
        engine.invocations = Some(Arc::new(InvocationRegistry::new()));

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        engine.outbound = Some(outbound_tx);
        spawn_writer(transport, outbound_rx);

        self.deadlines.reset_server_timeout(config.server_timeout);
        self.deadlines.reset_keep_alive(config.keep_alive_interval);
        engine.keep_alive = Some(self.spawn_supervisor(config.tick_rate));

        let _ = waiter.send(Ok(()));
        info!("HubConnection started");
        true
    }

    fn fail_handshake(&self, error: HubError) {
        error!("Handshake failed: {}", error);
        if let Some(waiter) = self.engine.lock().handshake.take() {
            let _ = waiter.send(Err(error));
        }
    }

    fn spawn_supervisor(self: &Arc<Self>, tick_rate: Duration) -> KeepAliveHandle {
        let weak = Arc::downgrade(self);
        spawn_keep_alive(tick_rate, Arc::clone(&self.deadlines), move |action| {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return TickOutcome::Stop;
                };
                match action {
                    KeepAliveAction::ServerTimeout => {
                        error!("{}", HubError::ServerTimeout);
                        if let Err(e) = inner.stop_with(Some(HubError::ServerTimeout)).await {
                            debug!("Error stopping transport after server timeout: {}", e);
                        }
                        TickOutcome::Stop
                    }
                    KeepAliveAction::SendPing => match inner.send_hub_message(&HubMessage::Ping, "ping") {
                        Ok(()) => TickOutcome::Continue,
                        Err(e) => {
                            warn!("Error sending ping: {}", e);
                            TickOutcome::Stop
                        }
                    },
                    KeepAliveAction::Idle => TickOutcome::Continue,
                }
            }
        })
    }

    async fn stop_with(&self, error: Option<HubError>) -> Result<()> {
        let transport = {
            let mut engine = self.engine.lock();
            if engine.state.is_disconnected() {
                return Ok(());
            }
            if engine.stop_error.is_none() {
                engine.stop_error = error.clone();
            }
            engine.transport.clone()
        };

        debug!("Stopping HubConnection");
        let result = match transport {
            Some(transport) => transport.stop().await,
            None => Ok(()),
        };

        self.teardown(error);
        result
    }

    fn on_transport_closed(&self, reason: Option<String>) {
        let error = reason.map(HubError::ConnectionClosed);

        let pending_handshake = self.engine.lock().handshake.take();
        if let Some(waiter) = pending_handshake {
            let _ = waiter.send(Err(error.unwrap_or_else(closed_during_handshake)));
            return;
        }

        self.teardown(error);
    }

    /// Single exit path out of `Connected`; idempotent
    fn teardown(&self, error: Option<HubError>) {
        let (registry, keep_alive, error) = {
            let mut engine = self.engine.lock();
            if engine.state.is_disconnected() {
                return;
            }
            engine.state = ConnectionState::Disconnected;
            engine.generation += 1;
            engine.outbound = None;
            engine.transport = None;
            let error = engine.stop_error.clone().or(error);
            (engine.invocations.take(), engine.keep_alive.take(), error)
        };

        match &error {
            Some(e) => error!("HubConnection closed with an error: {}", e),
            None => info!("HubConnection stopped"),
        }

        if let Some(registry) = registry {
            registry.cancel_all(error.clone());
        }
        if let Some(keep_alive) = keep_alive {
            keep_alive.shutdown();
        }

        let callbacks = self.closed_callbacks.read().clone();
        for callback in callbacks {
            callback(error.clone());
        }
    }

    fn ensure_connected(&self, method: &str) -> Result<()> {
        if self.engine.lock().state.is_connected() {
            Ok(())
        } else {
            Err(HubError::NotConnected(method.to_string()))
        }
    }

    fn active_registry(&self, method: &str) -> Result<Arc<InvocationRegistry>> {
        let engine = self.engine.lock();
        match (&engine.state, &engine.invocations) {
            (ConnectionState::Connected, Some(registry)) => Ok(Arc::clone(registry)),
            _ => Err(HubError::NotConnected(method.to_string())),
        }
    }

    fn active_invocations(&self) -> Option<Arc<InvocationRegistry>> {
        self.engine.lock().invocations.clone()
    }

    /// Encode and queue one message for the writer
    fn send_hub_message(&self, message: &HubMessage, method: &str) -> Result<()> {
        let frame = self.protocol.write_message(message)?;
        {
            let engine = self.engine.lock();
            let outbound = match (&engine.state, &engine.outbound) {
                (ConnectionState::Connected, Some(outbound)) => outbound,
                _ => return Err(HubError::NotConnected(method.to_string())),
            };
            outbound
                .send(frame)
                .map_err(|_| HubError::ConnectionClosed("Outbound queue closed".to_string()))?;
        }

        let keep_alive_interval = self.config.read().keep_alive_interval;
        self.deadlines.reset_keep_alive(keep_alive_interval);
        debug!("Queued {} message", message.message_type());
        Ok(())
    }

    fn cancel_stream(&self, invocation_id: &str) {
        let Some(request) = self
            .active_invocations()
            .and_then(|registry| registry.remove(invocation_id))
        else {
            return;
        };

        request.cancel();
        let message = HubMessage::CancelInvocation(CancelInvocationMessage {
            invocation_id: invocation_id.to_string(),
        });
        if let Err(e) = self.send_hub_message(&message, "stream") {
            debug!("Could not send CancelInvocation for '{}': {}", invocation_id, e);
        }
    }
}

fn parse_handshake(frame: &str) -> Result<()> {
    let response = handshake::parse_response(frame)?;
    match response.error {
        Some(error) => Err(HubError::Handshake(error)),
        None => Ok(()),
    }
}

fn closed_during_handshake() -> HubError {
    HubError::ConnectionClosed("Connection closed before the handshake completed".to_string())
}

fn spawn_writer(transport: Arc<dyn Transport>, mut outbound: mpsc::UnboundedReceiver<String>) {
    tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = transport.send(frame).await {
                error!("Failed to send message: {}", e);
            }
        }
        debug!("Writer task exiting");
    });
}

fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(HubError::from)
}

/// Result of [`HubConnection::invoke`]
pub struct PendingInvocation<T> {
    invocation_id: String,
    receiver: SingleReceiver,
    _result: PhantomData<fn() -> T>,
}

impl<T> PendingInvocation<T> {
    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }
}

impl<T> fmt::Debug for PendingInvocation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingInvocation")
            .field("invocation_id", &self.invocation_id)
            .finish()
    }
}

impl<T: DeserializeOwned> Future for PendingInvocation<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(_)) => Poll::Ready(Err(HubError::Canceled)),
            Poll::Ready(Ok(Err(e))) => Poll::Ready(Err(e)),
            Poll::Ready(Ok(Ok(result))) => Poll::Ready(decode_value(result.unwrap_or(Value::Null))),
        }
    }
}

/// Items of a streaming invocation, in arrival order
///
/// Ends after the server completes the invocation. An error completion or a
/// stop yields one final `Err` item.
pub struct HubStream<T> {
    invocation_id: String,
    receiver: StreamReceiver,
    connection: Weak<ConnectionInner>,
    finished: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T> HubStream<T> {
    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }
}

impl<T> fmt::Debug for HubStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubStream")
            .field("invocation_id", &self.invocation_id)
            .field("finished", &self.finished)
            .finish()
    }
}

impl<T: DeserializeOwned> Stream for HubStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        match this.receiver.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Ready(Some(Ok(item))) => Poll::Ready(Some(decode_value(item))),
            Poll::Ready(Some(Err(e))) => {
                this.finished = true;
                Poll::Ready(Some(Err(e)))
            }
        }
    }
}

impl<T> Drop for HubStream<T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(connection) = self.connection.upgrade() {
            connection.cancel_stream(&self.invocation_id);
        }
    }
}

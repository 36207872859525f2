//! Outstanding invocation tracking
//!
//! Every `invoke()` or `stream()` call registers an [`InvocationRequest`]
//! under a connection-unique id. Each request is resolved exactly once:
//! by a completion, a failure or a cancellation, whichever comes first.

use crate::error::{HubError, Result};
use crate::protocol::CompletionMessage;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Receiving end of a single-result invocation
pub type SingleReceiver = oneshot::Receiver<Result<Option<Value>>>;

/// Receiving end of a streaming invocation
pub type StreamReceiver = mpsc::UnboundedReceiver<Result<Value>>;

enum PendingCall {
    Single(oneshot::Sender<Result<Option<Value>>>),
    Stream(mpsc::UnboundedSender<Result<Value>>),
}

/// One outstanding invocation
pub struct InvocationRequest {
    invocation_id: String,
    call: Mutex<Option<PendingCall>>,
}

impl InvocationRequest {
    /// Request expecting a single completion
    pub fn single(invocation_id: impl Into<String>) -> (Arc<Self>, SingleReceiver) {
        let (tx, rx) = oneshot::channel();
        let request = Arc::new(Self {
            invocation_id: invocation_id.into(),
            call: Mutex::new(Some(PendingCall::Single(tx))),
        });
        (request, rx)
    }

    /// Request expecting stream items followed by a completion
    pub fn stream(invocation_id: impl Into<String>) -> (Arc<Self>, StreamReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let request = Arc::new(Self {
            invocation_id: invocation_id.into(),
            call: Mutex::new(Some(PendingCall::Stream(tx))),
        });
        (request, rx)
    }

    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    pub fn is_resolved(&self) -> bool {
        self.call.lock().is_none()
    }

    /// Resolve with a completion message
    ///
    /// An error completes the caller with [`HubError::Remote`]. For streams a
    /// result is delivered as a last item before the stream closes.
    pub fn complete(&self, completion: CompletionMessage) {
        let Some(call) = self.call.lock().take() else {
            return;
        };

        match (call, completion.error) {
            (PendingCall::Single(tx), Some(error)) => {
                let _ = tx.send(Err(HubError::Remote(error)));
            }
            (PendingCall::Single(tx), None) => {
                let _ = tx.send(Ok(completion.result));
            }
            (PendingCall::Stream(tx), Some(error)) => {
                let _ = tx.send(Err(HubError::Remote(error)));
            }
            (PendingCall::Stream(tx), None) => {
                if let Some(result) = completion.result.filter(|r| !r.is_null()) {
                    let _ = tx.send(Ok(result));
                }
            }
        }
    }

    /// Deliver one stream item
    ///
    /// Ignored for single-result requests and after resolution.
    pub fn add_item(&self, item: Value) {
        match &*self.call.lock() {
            Some(PendingCall::Stream(tx)) => {
                let _ = tx.send(Ok(item));
            }
            Some(PendingCall::Single(_)) => {
                debug!(
                    "Stream item for non-streaming invocation '{}' ignored",
                    self.invocation_id
                );
            }
            None => {}
        }
    }

    /// Resolve with an error
    pub fn fail(&self, error: HubError) {
        match self.call.lock().take() {
            Some(PendingCall::Single(tx)) => {
                let _ = tx.send(Err(error));
            }
            Some(PendingCall::Stream(tx)) => {
                let _ = tx.send(Err(error));
            }
            None => {}
        }
    }

    /// Resolve as canceled
    pub fn cancel(&self) {
        self.fail(HubError::Canceled);
    }
}

#[derive(Default)]
struct RegistryInner {
    pending: HashMap<String, Arc<InvocationRequest>>,
    closed: bool,
}

/// Outstanding invocations of one connection lifetime
///
/// A fresh registry is created on every successful start, so ids restart at
/// `"1"` and a registry closed by a stop refuses new requests.
pub struct InvocationRegistry {
    next_id: AtomicU64,
    inner: Mutex<RegistryInner>,
}

impl InvocationRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// Allocate the next invocation id
    pub fn next_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    pub fn add(&self, request: Arc<InvocationRequest>) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(HubError::NotConnected("invoke".to_string()));
        }
        if inner.pending.contains_key(request.invocation_id()) {
            return Err(HubError::DuplicateInvocation(request.invocation_id().to_string()));
        }
        inner.pending.insert(request.invocation_id().to_string(), request);
        Ok(())
    }

    pub fn get(&self, invocation_id: &str) -> Option<Arc<InvocationRequest>> {
        self.inner.lock().pending.get(invocation_id).cloned()
    }

    pub fn remove(&self, invocation_id: &str) -> Option<Arc<InvocationRequest>> {
        self.inner.lock().pending.remove(invocation_id)
    }

    /// Close the registry and resolve everything outstanding
    ///
    /// `None` cancels every request; an error fails every request with it.
    pub fn cancel_all(&self, error: Option<HubError>) {
        let drained: Vec<Arc<InvocationRequest>> = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            inner.pending.drain().map(|(_, request)| request).collect()
        };

        if !drained.is_empty() {
            debug!("Resolving {} outstanding invocation(s)", drained.len());
        }

        for request in drained {
            match &error {
                Some(error) => request.fail(error.clone()),
                None => request.cancel(),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InvocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

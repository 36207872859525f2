//! Client method handlers
//!
//! Maps a hub method name to the handlers registered for it, in
//! registration order. Handlers survive stop and restart of the connection.

use crate::protocol::{ArgType, InvocationBinder};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Handler body, called with arguments already checked against `arg_types`
pub type HandlerAction = Arc<dyn Fn(&[Value]) + Send + Sync>;

pub struct InvocationHandler {
    id: u64,
    arg_types: Vec<ArgType>,
    action: HandlerAction,
}

impl InvocationHandler {
    pub fn arg_types(&self) -> &[ArgType] {
        &self.arg_types
    }

    pub fn invoke(&self, arguments: &[Value]) {
        (self.action)(arguments)
    }
}

#[derive(Default)]
pub struct CallbackMap {
    handlers: RwLock<HashMap<String, Vec<Arc<InvocationHandler>>>>,
    next_id: AtomicU64,
}

impl CallbackMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler and return its subscription
    pub fn put(self: &Arc<Self>, target: &str, arg_types: Vec<ArgType>, action: HandlerAction) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handler = Arc::new(InvocationHandler {
            id,
            arg_types,
            action,
        });

        self.handlers
            .write()
            .entry(target.to_string())
            .or_default()
            .push(handler);

        debug!("Registered handler {} for '{}'", id, target);

        Subscription {
            map: Arc::downgrade(self),
            target: target.to_string(),
            handler_id: id,
        }
    }

    /// Snapshot of the handlers for `target`, in registration order
    pub fn get(&self, target: &str) -> Option<Vec<Arc<InvocationHandler>>> {
        self.handlers.read().get(target).cloned()
    }

    /// Drop every handler for `target`
    pub fn remove(&self, target: &str) {
        if self.handlers.write().remove(target).is_some() {
            debug!("Removed all handlers for '{}'", target);
        }
    }

    fn remove_handler(&self, target: &str, handler_id: u64) {
        let mut handlers = self.handlers.write();
        if let Some(list) = handlers.get_mut(target) {
            list.retain(|handler| handler.id != handler_id);
            if list.is_empty() {
                handlers.remove(target);
            }
        }
    }

    pub fn contains(&self, target: &str) -> bool {
        self.handlers.read().contains_key(target)
    }
}

impl InvocationBinder for CallbackMap {
    fn parameter_types(&self, target: &str) -> Option<Vec<ArgType>> {
        self.handlers
            .read()
            .get(target)
            .and_then(|list| list.first())
            .map(|handler| handler.arg_types.clone())
    }
}

/// Handle to one registered handler
///
/// Dropping the subscription keeps the handler registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    map: Weak<CallbackMap>,
    target: String,
    handler_id: u64,
}

impl Subscription {
    /// Remove this handler; calling it again has no effect
    pub fn unsubscribe(&self) {
        if let Some(map) = self.map.upgrade() {
            map.remove_handler(&self.target, self.handler_id);
        }
    }
}

//! # Connection engine
//!
//! - **connection**: lifecycle state machine, message pump and public surface
//! - **invocations** / **callbacks**: outstanding requests and client method handlers
//! - **negotiate**: base URL to transport URL resolution
//! - **deadlines** / **heartbeat**: keep-alive supervisor
//! - **builder** / **config**: construction and timing settings

pub mod builder;
pub mod callbacks;
pub mod config;
pub mod connection;
pub mod connection_state;
pub mod deadlines;
pub mod heartbeat;
pub mod invocations;
pub mod negotiate;

// Re-export main types
pub use builder::{states, HubConnectionBuilder};
pub use callbacks::{CallbackMap, Subscription};
pub use config::ConnectionConfig;
pub use connection::{ClosedCallback, HubConnection, HubStream, PendingInvocation};
pub use connection_state::ConnectionState;
pub use deadlines::{KeepAliveAction, KeepAliveDeadlines};
pub use invocations::{InvocationRegistry, InvocationRequest};
pub use negotiate::NegotiateResponse;

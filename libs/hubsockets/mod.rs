//! # HubSockets
//!
//! Client for hub-style RPC over WebSocket: a persistent connection that
//! negotiates an endpoint, performs a JSON handshake and then exchanges
//! framed invocations, stream items, completions, pings and close messages.
//!
//! ## Features
//!
//! - **Negotiation**: redirect following with access token hand-over
//! - **Invocations**: fire-and-forget `send`, awaitable `invoke`, cancellable `stream`
//! - **Typed handlers**: `on` decodes arguments into tuples, checked per message
//! - **Keep-alive**: periodic pings and server timeout detection
//! - **Pluggable collaborators**: transport, HTTP client and token provider are traits
//!
//! ## Example
//!
//! ```rust,ignore
//! use hubsockets::HubConnection;
//!
//! #[tokio::main]
//! async fn main() -> hubsockets::Result<()> {
//!     let connection = HubConnection::builder()
//!         .url("http://localhost:5000/chat")
//!         .build()?;
//!
//!     connection.on("ReceiveMessage", |(user, text): (String, String)| {
//!         println!("{}: {}", user, text);
//!     });
//!
//!     connection.start().await?;
//!     connection.send("SendMessage", ("me", "hello"))?;
//!     let sum: i32 = connection.invoke("Add", (1, 2))?.await?;
//!     connection.stop().await
//! }
//! ```

pub mod core;
pub mod protocol;
pub mod traits;
pub mod transport;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use self::core::{
    builder, callbacks, config, connection, connection_state, deadlines, heartbeat, invocations, negotiate,
    builder::{states, HubConnectionBuilder},
    callbacks::Subscription,
    config::ConnectionConfig,
    connection::{HubConnection, HubStream, PendingInvocation},
    connection_state::ConnectionState,
};

pub use protocol::{ArgType, HubArgs, HubMessage, HubProtocol, JsonHubProtocol};
pub use transport::{ReqwestHttpClient, WebSocketTransport};

//! Default collaborators: WebSocket transport and negotiate HTTP client

pub mod http;
pub mod websocket;

pub use http::ReqwestHttpClient;
pub use websocket::{to_websocket_url, WebSocketTransport};

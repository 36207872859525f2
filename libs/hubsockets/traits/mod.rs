//! # HubSockets Traits
//!
//! Collaborator seams and the shared error type:
//!
//! - **Transport**: bidirectional text transport driven by the engine
//! - **HttpClient**: `POST` used by the negotiation resolver
//! - **AccessTokenProvider**: async bearer token source
//! - **HubError**: every failure the engine can report

pub mod auth;
pub mod error;
pub mod headers;
pub mod http;
pub mod transport;

pub use auth::{AccessTokenProvider, StaticTokenProvider};
pub use error::{HubError, Result};
pub use headers::{set_bearer_token, Headers, AUTHORIZATION};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use transport::{CloseCallback, ReceiveCallback, Transport, TransportFactory};

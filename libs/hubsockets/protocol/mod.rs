//! Wire protocol: messages, JSON codec, handshake and argument binding

pub mod binder;
pub mod handshake;
pub mod json;
pub mod message;

pub use binder::{bind_arguments, to_arguments, ArgType, HubArgs, InvocationBinder, NoBinder};
pub use handshake::{HandshakeRequest, HandshakeResponse};
pub use json::{HubProtocol, JsonHubProtocol};
pub use message::*;

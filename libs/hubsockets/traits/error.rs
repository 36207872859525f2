use thiserror::Error;

/// Main error type for hubsockets
///
/// Every variant carries owned strings so the error can be cloned and handed to
/// every caller that awaits the same start attempt or the same close event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Transport failed to start, send or stop
    #[error("Transport error: {0}")]
    Transport(String),

    /// Connection closed by the server or the transport
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// No message arrived from the server within the server timeout
    #[error("Server timeout elapsed without receiving a message from the server")]
    ServerTimeout,

    /// A public operation was called while the connection is not active
    #[error("The '{0}' method cannot be called if the connection is not active")]
    NotConnected(String),

    /// Negotiate request failed or the server reported an error
    #[error("Negotiate failed: {0}")]
    Negotiate(String),

    /// The server kept redirecting negotiation
    #[error("Negotiate redirection limit exceeded")]
    RedirectLimitExceeded,

    /// The server does not offer the WebSockets transport
    #[error("There were no compatible transports on the server")]
    NoCompatibleTransports,

    /// The handshake response was not a JSON object
    #[error("An invalid handshake response was received from the server: {0}")]
    MalformedHandshake(String),

    /// The server rejected the handshake
    #[error("Error in handshake {0}")]
    Handshake(String),

    /// The server did not answer the handshake in time
    #[error("Timed out waiting for the server to respond to the handshake message")]
    HandshakeTimeout,

    /// The hub method failed on the server
    #[error("Remote invocation failed: {0}")]
    Remote(String),

    /// The invocation was canceled by an orderly stop
    #[error("Invocation was canceled")]
    Canceled,

    /// An invocation id is already outstanding
    #[error("Duplicate invocation id: {0}")]
    DuplicateInvocation(String),

    /// The payload carried a message type this client does not handle
    #[error("Unsupported message: {0}")]
    UnsupportedMessage(String),

    /// The payload could not be parsed
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Invocation arguments did not match the registered handler signature
    #[error("Invocation binding failed: {0}")]
    InvocationBinding(String),

    /// Argument or result (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        HubError::Serialization(err.to_string())
    }
}

/// Result type for hubsockets operations
pub type Result<T> = std::result::Result<T, HubError>;

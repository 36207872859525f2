use std::fmt;

/// Lifecycle state of a hub connection
///
/// There is no intermediate `Connecting` state: `start()` is a no-op while
/// connected and a failed start leaves the connection disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    #[inline]
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    #[inline]
    pub fn is_disconnected(self) -> bool {
        self == ConnectionState::Disconnected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("Disconnected"),
            ConnectionState::Connected => f.write_str("Connected"),
        }
    }
}

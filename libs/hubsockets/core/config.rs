use crate::error::{HubError, Result};
use std::time::Duration;

pub const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_TICK_RATE: Duration = Duration::from_secs(1);
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

/// Timing and negotiation settings of a hub connection
///
/// Built by [`HubConnectionBuilder`](crate::builder::HubConnectionBuilder) and
/// adjustable at runtime through the connection setters. Timeout changes take
/// effect the next time the corresponding deadline is reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Close the connection if the server stays silent this long
    pub server_timeout: Duration,

    /// Send a ping if nothing was sent for this long
    pub keep_alive_interval: Duration,

    /// How often the keep-alive supervisor checks its deadlines
    pub tick_rate: Duration,

    /// How long `start()` waits for the handshake response
    pub handshake_timeout: Duration,

    /// Use the base URL verbatim instead of negotiating
    pub skip_negotiate: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server_timeout: DEFAULT_SERVER_TIMEOUT,
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            tick_rate: DEFAULT_TICK_RATE,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            skip_negotiate: false,
        }
    }
}

impl ConnectionConfig {
    /// Reject zero durations, which would make the supervisor spin or time out instantly
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("server_timeout", self.server_timeout),
            ("keep_alive_interval", self.keep_alive_interval),
            ("tick_rate", self.tick_rate),
            ("handshake_timeout", self.handshake_timeout),
        ];
        for (name, value) in durations {
            if value.is_zero() {
                return Err(HubError::Configuration(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.server_timeout, Duration::from_secs(30));
        assert_eq!(config.keep_alive_interval, Duration::from_secs(15));
        assert_eq!(config.tick_rate, Duration::from_secs(1));
        assert_eq!(config.handshake_timeout, Duration::from_secs(15));
        assert!(!config.skip_negotiate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = ConnectionConfig {
            tick_rate: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(HubError::Configuration("tick_rate must be greater than zero".to_string()))
        );
    }
}

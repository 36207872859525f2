pub mod states;

use crate::auth::{AccessTokenProvider, StaticTokenProvider};
use crate::config::ConnectionConfig;
use crate::connection::{ConnectionParts, HubConnection};
use crate::error::{HubError, Result};
use crate::headers::Headers;
use crate::http::HttpClient;
use crate::traits::transport::{Transport, TransportFactory};
use states::*;
use std::sync::Arc;
use std::time::Duration;

/// Type-state builder for [`HubConnection`]
///
/// The URL must be set before `build()` becomes available. Everything else
/// falls back to the defaults of [`ConnectionConfig`] and the bundled
/// WebSocket and HTTP collaborators.
pub struct HubConnectionBuilder<U>
where
    U: UrlState,
{
    _state: TypeState<U>,
    url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    transport_factory: Option<TransportFactory>,
    http_client: Option<Arc<dyn HttpClient>>,
    token_provider: Option<Arc<dyn AccessTokenProvider>>,
    headers: Headers,
    config: ConnectionConfig,
}

impl HubConnectionBuilder<NoUrl> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            url: None,
            transport: None,
            transport_factory: None,
            http_client: None,
            token_provider: None,
            headers: Headers::new(),
            config: ConnectionConfig::default(),
        }
    }

    pub fn url(self, url: impl Into<String>) -> HubConnectionBuilder<HasUrl> {
        HubConnectionBuilder {
            _state: TypeState::new(),
            url: Some(url.into()),
            transport: self.transport,
            transport_factory: self.transport_factory,
            http_client: self.http_client,
            token_provider: self.token_provider,
            headers: self.headers,
            config: self.config,
        }
    }
}

impl Default for HubConnectionBuilder<NoUrl> {
    fn default() -> Self {
        Self::new()
    }
}

// Optional configuration, available in every state
impl<U> HubConnectionBuilder<U>
where
    U: UrlState,
{
    /// Use this transport for every start instead of a fresh WebSocket
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build a fresh transport on every start
    pub fn transport_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Transport> + Send + Sync + 'static,
    {
        self.transport_factory = Some(Arc::new(factory));
        self
    }

    /// HTTP client used for negotiation
    pub fn http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Connect to the URL as given, without negotiating
    pub fn skip_negotiate(mut self, skip: bool) -> Self {
        self.config.skip_negotiate = skip;
        self
    }

    /// Token source queried at the beginning of every start
    pub fn access_token_provider(mut self, provider: Arc<dyn AccessTokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Static bearer token
    pub fn access_token(self, token: impl Into<String>) -> Self {
        self.access_token_provider(Arc::new(StaticTokenProvider::new(token)))
    }

    /// Add one header; a later value for the same name wins
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn server_timeout(mut self, timeout: Duration) -> Self {
        self.config.server_timeout = timeout;
        self
    }

    pub fn keep_alive_interval(mut self, interval: Duration) -> Self {
        self.config.keep_alive_interval = interval;
        self
    }

    #[doc(hidden)]
    pub fn tick_rate(mut self, tick_rate: Duration) -> Self {
        self.config.tick_rate = tick_rate;
        self
    }

    /// Replace all timing settings at once
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }
}

impl HubConnectionBuilder<HasUrl> {
    /// Build the connection; nothing is opened until `start()`
    pub fn build(self) -> Result<HubConnection> {
        let base_url = self.url.unwrap_or_default();
        if base_url.trim().is_empty() {
            return Err(HubError::Configuration("A valid url is required".to_string()));
        }

        self.config.validate()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => Arc::new(crate::transport::ReqwestHttpClient::new()),
        };

        Ok(HubConnection::from_parts(ConnectionParts {
            base_url,
            transport: self.transport,
            transport_factory: self.transport_factory,
            http_client,
            token_provider: self.token_provider,
            headers: self.headers,
            config: self.config,
        }))
    }
}

impl HubConnection {
    /// Start building a connection
    pub fn builder() -> HubConnectionBuilder<NoUrl> {
        HubConnectionBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection_state::ConnectionState;

    #[test]
    fn test_empty_url_rejected() {
        let result = HubConnection::builder().url("").build();
        assert!(matches!(
            result,
            Err(HubError::Configuration(msg)) if msg == "A valid url is required"
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = HubConnection::builder()
            .url("http://example.com")
            .server_timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(HubError::Configuration(_))));
    }

    #[test]
    fn test_builder_applies_timeouts() {
        let connection = HubConnection::builder()
            .url("http://example.com")
            .handshake_timeout(Duration::from_secs(5))
            .server_timeout(Duration::from_secs(60))
            .keep_alive_interval(Duration::from_secs(20))
            .build()
            .unwrap();

        assert_eq!(connection.handshake_timeout(), Duration::from_secs(5));
        assert_eq!(connection.server_timeout(), Duration::from_secs(60));
        assert_eq!(connection.keep_alive_interval(), Duration::from_secs(20));
        assert_eq!(connection.connection_state(), ConnectionState::Disconnected);
        assert_eq!(connection.base_url(), "http://example.com");
    }

    #[test]
    fn test_later_header_overwrites() {
        let builder = HubConnection::builder()
            .url("http://example.com")
            .header("X-Test", "one")
            .header("X-Test", "two");
        assert_eq!(builder.headers.get("X-Test").map(String::as_str), Some("two"));
    }
}

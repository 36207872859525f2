use crate::error::Result;
use async_trait::async_trait;

/// Supplies the bearer token used for negotiation and the WebSocket upgrade
///
/// Called once at the beginning of every `start()`, so implementations can
/// refresh expiring tokens. Returning an empty string means "no token".
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Provider that always returns the same token
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

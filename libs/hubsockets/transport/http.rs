use crate::error::{HubError, Result};
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// `reqwest` backed [`HttpClient`] used for negotiation
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post(&self, url: &str, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.post(url).body(Vec::<u8>::new());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HubError::Negotiate(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let content = response
            .text()
            .await
            .map_err(|e| HubError::Negotiate(format!("Failed to read response body: {}", e)))?;

        debug!("POST {} -> {}", url, status.as_u16());
        Ok(HttpResponse::new(status.as_u16(), status_text, content))
    }
}

use crate::error::Result;
use crate::headers::Headers;
use async_trait::async_trait;

/// Outgoing HTTP request used for negotiation
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub headers: Headers,
}

impl HttpRequest {
    pub fn with_headers(headers: Headers) -> Self {
        Self { headers }
    }
}

/// HTTP response as seen by the negotiation resolver
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: String,
    pub content: String,
}

impl HttpResponse {
    pub fn new(status_code: u16, status_text: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            status_code,
            status_text: status_text.into(),
            content: content.into(),
        }
    }
}

/// Minimal HTTP client seam, only `POST` is needed
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post(&self, url: &str, request: HttpRequest) -> Result<HttpResponse>;
}

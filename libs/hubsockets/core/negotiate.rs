//! Negotiation resolver
//!
//! Turns the configured base URL into the URL the transport connects to:
//!
//! ```text
//! base ──POST base/negotiate──> { url, accessToken }   ──> follow redirect (≤ 100 hops)
//!                           └──> { connectionId, availableTransports } ──> base?id=...
//!                           └──> { error }             ──> fail
//! ```

use crate::error::{HubError, Result};
use crate::headers::{set_bearer_token, Headers};
use crate::http::{HttpClient, HttpRequest};
use serde::Deserialize;
use tracing::{debug, info};

/// Maximum number of redirects followed before giving up
pub const MAX_NEGOTIATE_ATTEMPTS: usize = 100;

/// Transport name the engine requires from the server
pub const WEBSOCKETS_TRANSPORT: &str = "WebSockets";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTransport {
    pub transport: String,
    #[serde(default)]
    pub transfer_formats: Vec<String>,
}

/// Body of a negotiate response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    #[serde(default)]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub available_transports: Vec<AvailableTransport>,
    /// Redirect target
    #[serde(default, rename = "url")]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl NegotiateResponse {
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| HubError::Negotiate(format!("Invalid negotiate response: {}", e)))
    }

    pub fn supports_transport(&self, name: &str) -> bool {
        self.available_transports.iter().any(|t| t.transport == name)
    }
}

/// Build `<base>/negotiate`, keeping the query string at the end
pub fn resolve_negotiate_url(url: &str) -> String {
    let (path, query) = match url.find('?') {
        Some(index) => url.split_at(index),
        None => (url, ""),
    };

    let mut negotiate_url = path.to_string();
    if !negotiate_url.ends_with('/') {
        negotiate_url.push('/');
    }
    negotiate_url.push_str("negotiate");
    negotiate_url.push_str(query);
    negotiate_url
}

/// Append the connection id as a query parameter
pub fn append_connection_id(url: &str, connection_id: &str) -> String {
    if url.contains('?') {
        format!("{}&id={}", url, connection_id)
    } else {
        format!("{}?id={}", url, connection_id)
    }
}

async fn negotiate_once(
    http: &dyn HttpClient,
    url: &str,
    headers: &mut Headers,
) -> Result<NegotiateResponse> {
    let negotiate_url = resolve_negotiate_url(url);
    debug!("Sending negotiate request to {}", negotiate_url);

    let response = http
        .post(&negotiate_url, HttpRequest::with_headers(headers.clone()))
        .await?;

    if response.status_code != 200 {
        return Err(HubError::Negotiate(format!(
            "Unexpected status code returned from negotiate: {} {}.",
            response.status_code, response.status_text
        )));
    }

    let negotiate = NegotiateResponse::parse(&response.content)?;

    if let Some(error) = &negotiate.error {
        return Err(HubError::Negotiate(error.clone()));
    }

    if let Some(token) = &negotiate.access_token {
        set_bearer_token(headers, token);
    }

    Ok(negotiate)
}

/// Resolve `base_url` into the final transport URL
///
/// Returns the URL together with the headers to use from now on, which
/// carry the last access token handed out by the server.
pub async fn resolve(http: &dyn HttpClient, base_url: &str, headers: Headers) -> Result<(String, Headers)> {
    let mut headers = headers;
    let mut url = base_url.to_string();
    let mut attempts = 0;

    loop {
        let response = negotiate_once(http, &url, &mut headers).await?;

        match response.redirect_url.clone() {
            Some(_) if attempts >= MAX_NEGOTIATE_ATTEMPTS => {
                return Err(HubError::RedirectLimitExceeded);
            }
            Some(redirect) => {
                debug!("Negotiate redirected to {}", redirect);
                url = redirect;
                attempts += 1;
            }
            None => {
                if !response.supports_transport(WEBSOCKETS_TRANSPORT) {
                    return Err(HubError::NoCompatibleTransports);
                }

                let final_url = match &response.connection_id {
                    Some(id) => append_connection_id(&url, id),
                    None => url,
                };

                info!("Negotiation complete after {} redirect(s)", attempts);
                return Ok((final_url, headers));
            }
        }
    }
}

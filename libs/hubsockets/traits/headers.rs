use std::collections::HashMap;

/// HTTP headers sent with the negotiate request and the WebSocket upgrade
pub type Headers = HashMap<String, String>;

/// Header carrying the bearer token
pub const AUTHORIZATION: &str = "Authorization";

/// Install `token` as the bearer token, replacing any earlier one
///
/// Empty tokens leave the headers untouched.
pub fn set_bearer_token(headers: &mut Headers, token: &str) {
    if token.is_empty() {
        return;
    }
    headers.insert(AUTHORIZATION.to_string(), format!("Bearer {}", token));
}

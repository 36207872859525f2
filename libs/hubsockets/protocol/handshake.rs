//! One-time handshake exchanged before any hub message
//!
//! The client sends `{"protocol":"json","version":1}\x1e` and the server
//! answers with `{}\x1e` or `{"error":"..."}\x1e`.

use super::message::RECORD_SEPARATOR;
use crate::error::{HubError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandshakeRequest {
    pub protocol: String,
    pub version: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HandshakeResponse {
    #[serde(default)]
    pub error: Option<String>,
}

/// Serialize the handshake request followed by the record separator
pub fn build_request(protocol: &str, version: u32) -> Result<String> {
    let request = HandshakeRequest {
        protocol: protocol.to_string(),
        version,
    };
    let mut encoded = serde_json::to_string(&request)?;
    encoded.push(RECORD_SEPARATOR);
    Ok(encoded)
}

/// Parse a handshake response frame (without its separator)
pub fn parse_response(frame: &str) -> Result<HandshakeResponse> {
    let value: Value = serde_json::from_str(frame)
        .map_err(|e| HubError::MalformedHandshake(e.to_string()))?;

    if !value.is_object() {
        return Err(HubError::MalformedHandshake(format!(
            "expected a JSON object, got '{}'",
            frame
        )));
    }

    serde_json::from_value(value).map_err(|e| HubError::MalformedHandshake(e.to_string()))
}

/// Split a payload into the handshake frame and whatever follows it
///
/// A payload without a separator is treated as a bare handshake frame.
pub fn split_handshake(payload: &str) -> (&str, &str) {
    match payload.find(RECORD_SEPARATOR) {
        Some(index) => (&payload[..index], &payload[index + RECORD_SEPARATOR.len_utf8()..]),
        None => (payload, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        assert_eq!(
            build_request("json", 1).unwrap(),
            "{\"protocol\":\"json\",\"version\":1}\u{1e}"
        );
    }

    #[test]
    fn test_parse_empty_object_is_success() {
        assert_eq!(parse_response("{}").unwrap(), HandshakeResponse { error: None });
    }

    #[test]
    fn test_parse_error_response() {
        let response =
            parse_response("{\"error\":\"Requested protocol 'messagepack' is not available.\"}")
                .unwrap();
        assert_eq!(
            response.error.as_deref(),
            Some("Requested protocol 'messagepack' is not available.")
        );
    }

    #[test]
    fn test_parse_malformed_is_distinct_error() {
        assert!(matches!(
            parse_response("{\"protocol\""),
            Err(HubError::MalformedHandshake(_))
        ));
        assert!(matches!(
            parse_response("[1,2]"),
            Err(HubError::MalformedHandshake(_))
        ));
    }

    #[test]
    fn test_split_handshake_with_trailing_messages() {
        let (handshake, rest) = split_handshake("{}\u{1e}{\"type\":6}\u{1e}");
        assert_eq!(handshake, "{}");
        assert_eq!(rest, "{\"type\":6}\u{1e}");

        let (handshake, rest) = split_handshake("{}\u{1e}");
        assert_eq!(handshake, "{}");
        assert_eq!(rest, "");
    }
}

//! JSON hub protocol
//!
//! Every frame is a single JSON object terminated by [`RECORD_SEPARATOR`].
//! A payload may carry several frames; they are decoded independently and
//! returned in the order they were framed. A frame that fails to decode
//! yields an error in its slot without affecting its neighbours.
//!
//! ```text
//! {"type":1,"target":"Send","arguments":["hi"]}\x1e{"type":6}\x1e
//! ```

use super::binder::{bind_arguments, InvocationBinder};
use super::message::*;
use crate::error::{HubError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// A message encoding negotiated during the handshake
pub trait HubProtocol: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> u32;

    /// Split `payload` into frames and decode each one
    fn parse_messages(&self, payload: &str, binder: &dyn InvocationBinder) -> Vec<Result<HubMessage>>;

    /// Encode one message including its trailing separator
    fn write_message(&self, message: &HubMessage) -> Result<String>;
}

/// The text protocol: `{"protocol":"json","version":1}`
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonHubProtocol;

impl JsonHubProtocol {
    pub fn new() -> Self {
        Self
    }
}

/// Fields of any inbound frame; unknown fields are ignored
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<u64>,
    invocation_id: Option<String>,
    target: Option<String>,
    arguments: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    item: Option<Value>,
    error: Option<String>,
}

/// `"result":null` is a result, an absent key is not
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvocationFrame<'a> {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    invocation_id: Option<&'a str>,
    target: &'a str,
    arguments: &'a [Value],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamItemFrame<'a> {
    #[serde(rename = "type")]
    kind: u8,
    invocation_id: &'a str,
    item: &'a Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionFrame<'a> {
    #[serde(rename = "type")]
    kind: u8,
    invocation_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelFrame<'a> {
    #[serde(rename = "type")]
    kind: u8,
    invocation_id: &'a str,
}

#[derive(Serialize)]
struct CloseFrame<'a> {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct PingFrame {
    #[serde(rename = "type")]
    kind: u8,
}

fn required<T>(value: Option<T>, field: &str, kind: HubMessageType) -> Result<T> {
    value.ok_or_else(|| {
        HubError::InvalidPayload(format!("{} message is missing '{}'", kind, field))
    })
}

fn decode_frame(frame: &str, binder: &dyn InvocationBinder) -> Result<HubMessage> {
    let raw: RawFrame =
        serde_json::from_str(frame).map_err(|e| HubError::InvalidPayload(e.to_string()))?;

    let code = raw
        .kind
        .ok_or_else(|| HubError::InvalidPayload("message is missing 'type'".to_string()))?;
    let kind = HubMessageType::from_code(code)
        .ok_or_else(|| HubError::UnsupportedMessage(format!("unknown message type {}", code)))?;

    let message = match kind {
        HubMessageType::Invocation => {
            let target = required(raw.target, "target", kind)?;
            let arguments = raw.arguments.unwrap_or_default();
            match binder.parameter_types(&target) {
                Some(types) => match bind_arguments(&target, &arguments, &types) {
                    Ok(()) => HubMessage::Invocation(InvocationMessage {
                        invocation_id: raw.invocation_id,
                        target,
                        arguments,
                    }),
                    Err(cause) => {
                        HubMessage::InvocationBindingFailure(InvocationBindingFailureMessage {
                            invocation_id: raw.invocation_id,
                            target,
                            cause,
                        })
                    }
                },
                None => HubMessage::Invocation(InvocationMessage {
                    invocation_id: raw.invocation_id,
                    target,
                    arguments,
                }),
            }
        }
        HubMessageType::StreamInvocation => HubMessage::StreamInvocation(StreamInvocationMessage {
            invocation_id: required(raw.invocation_id, "invocationId", kind)?,
            target: required(raw.target, "target", kind)?,
            arguments: raw.arguments.unwrap_or_default(),
        }),
        HubMessageType::StreamItem => HubMessage::StreamItem(StreamItemMessage {
            invocation_id: required(raw.invocation_id, "invocationId", kind)?,
            item: raw.item.unwrap_or(Value::Null),
        }),
        HubMessageType::Completion => {
            if raw.result.is_some() && raw.error.is_some() {
                return Err(HubError::InvalidPayload(
                    "Completion message carries both 'result' and 'error'".to_string(),
                ));
            }
            HubMessage::Completion(CompletionMessage {
                invocation_id: required(raw.invocation_id, "invocationId", kind)?,
                result: raw.result,
                error: raw.error,
            })
        }
        HubMessageType::CancelInvocation => HubMessage::CancelInvocation(CancelInvocationMessage {
            invocation_id: required(raw.invocation_id, "invocationId", kind)?,
        }),
        HubMessageType::Ping => HubMessage::Ping,
        HubMessageType::Close => HubMessage::Close(CloseMessage { error: raw.error }),
    };

    Ok(message)
}

impl HubProtocol for JsonHubProtocol {
    fn name(&self) -> &str {
        "json"
    }

    fn version(&self) -> u32 {
        1
    }

    fn parse_messages(&self, payload: &str, binder: &dyn InvocationBinder) -> Vec<Result<HubMessage>> {
        payload
            .split(RECORD_SEPARATOR)
            // The separator terminates frames, so the last split is empty
            .filter(|frame| !frame.trim().is_empty())
            .map(|frame| {
                let message = decode_frame(frame, binder)?;
                debug!("Decoded {} message", message.message_type());
                Ok(message)
            })
            .collect()
    }

    fn write_message(&self, message: &HubMessage) -> Result<String> {
        let kind = message.message_type().code();
        let mut encoded = match message {
            HubMessage::Invocation(m) => serde_json::to_string(&InvocationFrame {
                kind,
                invocation_id: m.invocation_id.as_deref(),
                target: &m.target,
                arguments: &m.arguments,
            })?,
            HubMessage::StreamInvocation(m) => serde_json::to_string(&InvocationFrame {
                kind,
                invocation_id: Some(&m.invocation_id),
                target: &m.target,
                arguments: &m.arguments,
            })?,
            HubMessage::StreamItem(m) => serde_json::to_string(&StreamItemFrame {
                kind,
                invocation_id: &m.invocation_id,
                item: &m.item,
            })?,
            HubMessage::Completion(m) => serde_json::to_string(&CompletionFrame {
                kind,
                invocation_id: &m.invocation_id,
                result: m.result.as_ref(),
                error: m.error.as_deref(),
            })?,
            HubMessage::CancelInvocation(m) => serde_json::to_string(&CancelFrame {
                kind,
                invocation_id: &m.invocation_id,
            })?,
            HubMessage::Close(m) => serde_json::to_string(&CloseFrame {
                kind,
                error: m.error.as_deref(),
            })?,
            HubMessage::Ping => serde_json::to_string(&PingFrame { kind })?,
            HubMessage::InvocationBindingFailure(m) => {
                return Err(HubError::UnsupportedMessage(format!(
                    "binding failure for '{}' cannot be sent",
                    m.target
                )))
            }
        };
        encoded.push(RECORD_SEPARATOR);
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::binder::{ArgType, NoBinder};
    use serde_json::json;
    use std::collections::HashMap;

    struct TestBinder(HashMap<&'static str, Vec<ArgType>>);

    impl InvocationBinder for TestBinder {
        fn parameter_types(&self, target: &str) -> Option<Vec<ArgType>> {
            self.0.get(target).cloned()
        }
    }

    fn parse(payload: &str) -> Result<Vec<HubMessage>> {
        JsonHubProtocol.parse_messages(payload, &NoBinder).into_iter().collect()
    }

    #[test]
    fn test_write_invocation_without_id() {
        let message = HubMessage::Invocation(InvocationMessage {
            invocation_id: None,
            target: "Send".to_string(),
            arguments: vec![json!("hi")],
        });
        assert_eq!(
            JsonHubProtocol.write_message(&message).unwrap(),
            "{\"type\":1,\"target\":\"Send\",\"arguments\":[\"hi\"]}\u{1e}"
        );
    }

    #[test]
    fn test_write_invocation_with_id() {
        let message = HubMessage::Invocation(InvocationMessage {
            invocation_id: Some("1".to_string()),
            target: "echo".to_string(),
            arguments: vec![json!("message")],
        });
        assert_eq!(
            JsonHubProtocol.write_message(&message).unwrap(),
            "{\"type\":1,\"invocationId\":\"1\",\"target\":\"echo\",\"arguments\":[\"message\"]}\u{1e}"
        );
    }

    #[test]
    fn test_write_ping_and_cancel() {
        assert_eq!(
            JsonHubProtocol.write_message(&HubMessage::Ping).unwrap(),
            "{\"type\":6}\u{1e}"
        );
        let cancel = HubMessage::CancelInvocation(CancelInvocationMessage {
            invocation_id: "3".to_string(),
        });
        assert_eq!(
            JsonHubProtocol.write_message(&cancel).unwrap(),
            "{\"type\":5,\"invocationId\":\"3\"}\u{1e}"
        );
    }

    #[test]
    fn test_parse_multiple_frames_in_order() {
        let messages = parse(
            "{\"type\":6}\u{1e}{\"type\":1,\"target\":\"inc\",\"arguments\":[]}\u{1e}{\"type\":7}\u{1e}",
        )
        .unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], HubMessage::Ping);
        assert_eq!(messages[1].message_type(), HubMessageType::Invocation);
        assert_eq!(messages[2], HubMessage::Close(CloseMessage { error: None }));
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let messages = parse("{\"type\":6,\"somethingNew\":{\"a\":1}}\u{1e}").unwrap();
        assert_eq!(messages, vec![HubMessage::Ping]);
    }

    #[test]
    fn test_parse_unknown_type_is_unsupported() {
        match parse("{\"type\":42}\u{1e}") {
            Err(HubError::UnsupportedMessage(_)) => {}
            other => panic!("expected unsupported message, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_frame_does_not_poison_neighbours() {
        let results = JsonHubProtocol.parse_messages(
            "{\"type\":6}\u{1e}{\"type\":42}\u{1e}{\"type\":3}\u{1e}{\"type\":3,\"invocationId\":\"1\",\"result\":5}\u{1e}",
            &NoBinder,
        );

        assert_eq!(results.len(), 4);
        assert_eq!(results[0], Ok(HubMessage::Ping));
        assert!(matches!(results[1], Err(HubError::UnsupportedMessage(_))));
        assert!(matches!(results[2], Err(HubError::InvalidPayload(_))));
        assert_eq!(
            results[3],
            Ok(HubMessage::Completion(CompletionMessage::with_result("1", json!(5))))
        );
    }

    #[test]
    fn test_null_result_is_kept() {
        let messages = parse(
            "{\"type\":3,\"invocationId\":\"1\",\"result\":null}\u{1e}{\"type\":3,\"invocationId\":\"2\"}\u{1e}",
        )
        .unwrap();
        assert_eq!(
            messages[0],
            HubMessage::Completion(CompletionMessage::with_result("1", Value::Null))
        );
        assert_eq!(messages[1], HubMessage::Completion(CompletionMessage::empty("2")));
    }

    #[test]
    fn test_parse_completion_with_result_and_error() {
        let messages = parse(
            "{\"type\":3,\"invocationId\":\"1\",\"result\":42}\u{1e}{\"type\":3,\"invocationId\":\"2\",\"error\":\"boom\"}\u{1e}",
        )
        .unwrap();
        assert_eq!(
            messages[0],
            HubMessage::Completion(CompletionMessage::with_result("1", json!(42)))
        );
        assert_eq!(
            messages[1],
            HubMessage::Completion(CompletionMessage::with_error("2", "boom"))
        );
    }

    #[test]
    fn test_parse_stream_item() {
        let messages = parse("{\"type\":2,\"invocationId\":\"4\",\"item\":\"x\"}\u{1e}").unwrap();
        assert_eq!(
            messages[0],
            HubMessage::StreamItem(StreamItemMessage {
                invocation_id: "4".to_string(),
                item: json!("x"),
            })
        );
    }

    #[test]
    fn test_binding_failure_keeps_rest_of_batch() {
        let mut types = HashMap::new();
        types.insert("add", vec![ArgType::of::<i32>(), ArgType::of::<i32>()]);
        let binder = TestBinder(types);

        let messages = JsonHubProtocol
            .parse_messages(
                "{\"type\":1,\"target\":\"add\",\"arguments\":[1]}\u{1e}{\"type\":1,\"target\":\"add\",\"arguments\":[1,2]}\u{1e}",
                &binder,
            )
            .into_iter()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(messages.len(), 2);
        match &messages[0] {
            HubMessage::InvocationBindingFailure(failure) => {
                assert_eq!(failure.target, "add");
                assert_eq!(
                    failure.cause,
                    "Invocation provides 1 argument(s) but target expects 2."
                );
            }
            other => panic!("expected binding failure, got {:?}", other),
        }
        assert_eq!(messages[1].message_type(), HubMessageType::Invocation);
    }

    #[test]
    fn test_round_trip_sent_and_received_variants() {
        let samples = vec![
            HubMessage::Invocation(InvocationMessage {
                invocation_id: Some("7".to_string()),
                target: "echo".to_string(),
                arguments: vec![json!("a"), json!(1), json!({"k": [true]})],
            }),
            HubMessage::Invocation(InvocationMessage {
                invocation_id: None,
                target: "Send".to_string(),
                arguments: vec![],
            }),
            HubMessage::Ping,
            HubMessage::Close(CloseMessage {
                error: Some("bye".to_string()),
            }),
            HubMessage::Completion(CompletionMessage::with_result("2", json!([1, 2]))),
            HubMessage::Completion(CompletionMessage::with_result("3", Value::Null)),
            HubMessage::Completion(CompletionMessage::empty("4")),
        ];

        for message in samples {
            let encoded = JsonHubProtocol.write_message(&message).unwrap();
            let decoded = parse(&encoded).unwrap();
            assert_eq!(decoded, vec![message]);
        }
    }
}

use serde_json::Value;
use std::fmt;

/// Record separator terminating every text frame
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Wire discriminant of each message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HubMessageType {
    Invocation = 1,
    StreamItem = 2,
    Completion = 3,
    StreamInvocation = 4,
    CancelInvocation = 5,
    Ping = 6,
    Close = 7,
}

impl HubMessageType {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::Invocation),
            2 => Some(Self::StreamItem),
            3 => Some(Self::Completion),
            4 => Some(Self::StreamInvocation),
            5 => Some(Self::CancelInvocation),
            6 => Some(Self::Ping),
            7 => Some(Self::Close),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for HubMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invocation => "Invocation",
            Self::StreamItem => "StreamItem",
            Self::Completion => "Completion",
            Self::StreamInvocation => "StreamInvocation",
            Self::CancelInvocation => "CancelInvocation",
            Self::Ping => "Ping",
            Self::Close => "Close",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvocationMessage {
    /// `None` for fire-and-forget sends
    pub invocation_id: Option<String>,
    pub target: String,
    pub arguments: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamInvocationMessage {
    pub invocation_id: String,
    pub target: String,
    pub arguments: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamItemMessage {
    pub invocation_id: String,
    pub item: Value,
}

/// At most one of `result` and `error` is set
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionMessage {
    pub invocation_id: String,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl CompletionMessage {
    pub fn with_result(invocation_id: impl Into<String>, result: Value) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn with_error(invocation_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn empty(invocation_id: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            result: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancelInvocationMessage {
    pub invocation_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloseMessage {
    pub error: Option<String>,
}

/// An invocation whose arguments could not be bound to the registered signature
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationBindingFailureMessage {
    pub invocation_id: Option<String>,
    pub target: String,
    pub cause: String,
}

/// Every message exchanged after the handshake
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    Invocation(InvocationMessage),
    StreamInvocation(StreamInvocationMessage),
    StreamItem(StreamItemMessage),
    Completion(CompletionMessage),
    CancelInvocation(CancelInvocationMessage),
    Close(CloseMessage),
    Ping,
    InvocationBindingFailure(InvocationBindingFailureMessage),
}

impl HubMessage {
    /// Wire type of this message; binding failures are reported as invocations
    pub fn message_type(&self) -> HubMessageType {
        match self {
            HubMessage::Invocation(_) | HubMessage::InvocationBindingFailure(_) => {
                HubMessageType::Invocation
            }
            HubMessage::StreamInvocation(_) => HubMessageType::StreamInvocation,
            HubMessage::StreamItem(_) => HubMessageType::StreamItem,
            HubMessage::Completion(_) => HubMessageType::Completion,
            HubMessage::CancelInvocation(_) => HubMessageType::CancelInvocation,
            HubMessage::Close(_) => HubMessageType::Close,
            HubMessage::Ping => HubMessageType::Ping,
        }
    }

    /// Invocation id carried by the message, if any
    pub fn invocation_id(&self) -> Option<&str> {
        match self {
            HubMessage::Invocation(m) => m.invocation_id.as_deref(),
            HubMessage::InvocationBindingFailure(m) => m.invocation_id.as_deref(),
            HubMessage::StreamInvocation(m) => Some(&m.invocation_id),
            HubMessage::StreamItem(m) => Some(&m.invocation_id),
            HubMessage::Completion(m) => Some(&m.invocation_id),
            HubMessage::CancelInvocation(m) => Some(&m.invocation_id),
            HubMessage::Close(_) | HubMessage::Ping => None,
        }
    }
}

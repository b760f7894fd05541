use serde_json::Value;
use thiserror::Error;

use crate::MessageKind;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MessageParseErrorCode {
    /// The stream line is not valid UTF-8.
    InvalidUtf8,
    /// The stream line exceeds the reader's byte cap; its content was discarded.
    LineTooLong,
    /// The stream line is not valid JSON.
    JsonParse,
    /// The raw message is not a JSON object.
    NotAnObject,
    /// `type` is absent, empty, or not a string.
    MissingType,
    /// The message claims a known kind but violates that kind's schema.
    TypedParse,
}

/// A parse fault. Unrecognized message kinds never produce one of these.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct MessageParseError {
    pub code: MessageParseErrorCode,
    pub kind: Option<MessageKind>,
    pub message: String,
    /// Copy of the offending raw message, when it decoded as JSON.
    pub data: Option<Value>,
}

impl MessageParseError {
    pub(crate) fn json_parse(source: serde_json::Error) -> Self {
        Self {
            code: MessageParseErrorCode::JsonParse,
            kind: None,
            message: format!("invalid JSON: {source}"),
            data: None,
        }
    }

    pub(crate) fn invalid_utf8(source: std::str::Utf8Error) -> Self {
        Self {
            code: MessageParseErrorCode::InvalidUtf8,
            kind: None,
            message: format!("invalid UTF-8: {source}"),
            data: None,
        }
    }

    pub(crate) fn line_too_long(observed_bytes: usize, max_line_bytes: usize) -> Self {
        Self {
            code: MessageParseErrorCode::LineTooLong,
            kind: None,
            message: format!(
                "line too long (observed_bytes={observed_bytes}, max_line_bytes={max_line_bytes})"
            ),
            data: None,
        }
    }

    pub(crate) fn not_an_object(data: &Value) -> Self {
        Self {
            code: MessageParseErrorCode::NotAnObject,
            kind: None,
            message: format!(
                "invalid message data type (expected object, got {})",
                json_type_name(data)
            ),
            data: Some(data.clone()),
        }
    }

    pub(crate) fn missing_type(data: &Value) -> Self {
        Self {
            code: MessageParseErrorCode::MissingType,
            kind: None,
            message: "message missing or non-string `type` field".to_string(),
            data: Some(data.clone()),
        }
    }

    pub(crate) fn typed_parse(
        kind: MessageKind,
        reason: impl std::fmt::Display,
        data: &Value,
    ) -> Self {
        Self {
            code: MessageParseErrorCode::TypedParse,
            kind: Some(kind),
            message: format!("{reason} in {} message", kind.as_str()),
            data: Some(data.clone()),
        }
    }
}

#[derive(Debug, Error)]
pub enum MessageStreamError {
    #[error("failed reading message stream: {0}")]
    Io(#[from] std::io::Error),
    #[error("stream-json line {line_number}: {source}")]
    Parse {
        line_number: usize,
        #[source]
        source: MessageParseError,
    },
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

use std::{collections::BTreeSet, fmt};

use serde::{de::Error as _, Deserialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    builder::MessageParserBuilder,
    message::{
        AssistantMessage, AssistantMessageError, ContentBlock, Message, ResultMessage,
        StreamEvent, SystemMessage, UserContent, UserMessage,
    },
    MessageParseError,
};

type Decoder = fn(&Value) -> Result<Message, serde_json::Error>;

/// Message kinds this crate knows how to decode.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum MessageKind {
    User,
    Assistant,
    System,
    Result,
    StreamEvent,
}

impl MessageKind {
    pub const ALL: [MessageKind; 5] = [
        MessageKind::User,
        MessageKind::Assistant,
        MessageKind::System,
        MessageKind::Result,
        MessageKind::StreamEvent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::User => "user",
            MessageKind::Assistant => "assistant",
            MessageKind::System => "system",
            MessageKind::Result => "result",
            MessageKind::StreamEvent => "stream_event",
        }
    }

    /// Looks up the kind for a `type` tag. Returns `None` for anything not built in.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    fn decoder(self) -> Decoder {
        match self {
            MessageKind::User => decode_user,
            MessageKind::Assistant => decode_assistant,
            MessageKind::System => decode_system,
            MessageKind::Result => decode_result,
            MessageKind::StreamEvent => decode_stream_event,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies raw stream-json messages and decodes the known kinds.
///
/// Parsing is a pure function of the input and the configured kind set:
/// - `Ok(Some(message))` for an enabled known kind that matches its schema;
/// - `Ok(None)` for any other `type` string (new CLI message kinds, disabled kinds);
/// - `Err(MessageParseError)` when the input is not an object, has no `type`,
///   or claims a known kind but violates that kind's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageParser {
    pub(crate) known: BTreeSet<MessageKind>,
}

impl Default for MessageParser {
    fn default() -> Self {
        Self {
            known: MessageKind::ALL.into_iter().collect(),
        }
    }
}

impl MessageParser {
    /// Parser with every built-in kind enabled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MessageParserBuilder {
        MessageParserBuilder::default()
    }

    pub fn known_kinds(&self) -> impl Iterator<Item = MessageKind> + '_ {
        self.known.iter().copied()
    }

    /// Whether a message with this `type` tag would be decoded rather than skipped.
    pub fn is_known(&self, tag: &str) -> bool {
        self.resolve(tag).is_some()
    }

    pub fn parse(&self, data: &Value) -> Result<Option<Message>, MessageParseError> {
        let Some(object) = data.as_object() else {
            return Err(MessageParseError::not_an_object(data));
        };

        let tag = match object.get("type").and_then(Value::as_str) {
            Some(tag) if !tag.is_empty() => tag,
            _ => return Err(MessageParseError::missing_type(data)),
        };

        let Some(kind) = self.resolve(tag) else {
            debug!(message_type = tag, "skipping unrecognized message type");
            return Ok(None);
        };

        (kind.decoder())(data)
            .map(Some)
            .map_err(|err| MessageParseError::typed_parse(kind, err, data))
    }

    fn resolve(&self, tag: &str) -> Option<MessageKind> {
        MessageKind::from_tag(tag).filter(|kind| self.known.contains(kind))
    }
}

/// Parses one raw message with the default kind set.
pub fn parse_message(data: &Value) -> Result<Option<Message>, MessageParseError> {
    MessageParser::default().parse(data)
}

#[derive(Deserialize)]
struct UserWire {
    message: UserBody,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    parent_tool_use_id: Option<String>,
    #[serde(default)]
    tool_use_result: Option<Value>,
}

#[derive(Deserialize)]
struct UserBody {
    content: Value,
}

#[derive(Deserialize)]
struct AssistantWire {
    message: AssistantBody,
    #[serde(default)]
    parent_tool_use_id: Option<String>,
    #[serde(default)]
    error: Option<AssistantMessageError>,
}

#[derive(Deserialize)]
struct AssistantBody {
    content: Vec<Value>,
    model: String,
}

#[derive(Deserialize)]
struct SystemWire {
    subtype: String,
}

fn decode_user(data: &Value) -> Result<Message, serde_json::Error> {
    let wire = UserWire::deserialize(data)?;
    let content = match wire.message.content {
        Value::String(text) => UserContent::Text(text),
        Value::Array(blocks) => UserContent::Blocks(decode_blocks(&blocks)?),
        _ => {
            return Err(serde_json::Error::custom(
                "`message.content` must be a string or an array of blocks",
            ))
        }
    };
    Ok(Message::User(UserMessage {
        content,
        uuid: wire.uuid,
        parent_tool_use_id: wire.parent_tool_use_id,
        tool_use_result: wire.tool_use_result,
    }))
}

fn decode_assistant(data: &Value) -> Result<Message, serde_json::Error> {
    let wire = AssistantWire::deserialize(data)?;
    Ok(Message::Assistant(AssistantMessage {
        content: decode_blocks(&wire.message.content)?,
        model: wire.message.model,
        parent_tool_use_id: wire.parent_tool_use_id,
        error: wire.error,
    }))
}

fn decode_system(data: &Value) -> Result<Message, serde_json::Error> {
    let wire = SystemWire::deserialize(data)?;
    Ok(Message::System(SystemMessage {
        subtype: wire.subtype,
        data: data.as_object().cloned().unwrap_or_default(),
    }))
}

fn decode_result(data: &Value) -> Result<Message, serde_json::Error> {
    ResultMessage::deserialize(data).map(Message::Result)
}

fn decode_stream_event(data: &Value) -> Result<Message, serde_json::Error> {
    StreamEvent::deserialize(data).map(Message::StreamEvent)
}

// Block types outside `ContentBlock::TYPES` are dropped, mirroring the message-level rule.
fn decode_blocks(blocks: &[Value]) -> Result<Vec<ContentBlock>, serde_json::Error> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let block_type = block
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| serde_json::Error::custom("content block missing `type`"))?;
        if !ContentBlock::TYPES.contains(&block_type) {
            debug!(block_type, "skipping unrecognized content block type");
            continue;
        }
        out.push(ContentBlock::deserialize(block)?);
    }
    Ok(out)
}

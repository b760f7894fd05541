#![forbid(unsafe_code)]
//! Typed, forward-compatible parsing of the Claude Code CLI `stream-json` output.
//!
//! The CLI adds new message kinds over time. [`parse_message`] decodes the kinds this
//! crate knows (`user`, `assistant`, `system`, `result`, `stream_event`) and returns
//! `Ok(None)` for anything else, so a newer CLI never breaks an older client. Only a
//! message that claims a known kind but violates its schema is an error.
//!
//! The readers in this crate apply that rule over whole streams: skipped messages are
//! simply absent from their output.

mod builder;
mod error;
mod message;
mod parser;
mod reader;
mod stream_json;

pub use builder::MessageParserBuilder;
pub use error::{MessageParseError, MessageParseErrorCode, MessageStreamError};
pub use message::{
    AssistantMessage, AssistantMessageError, ContentBlock, Message, ResultMessage, StreamEvent,
    SystemMessage, UserContent, UserMessage,
};
pub use parser::{parse_message, MessageKind, MessageParser};
pub use reader::DEFAULT_MAX_LINE_BYTES;
pub use stream_json::{
    message_jsonl_file, message_jsonl_reader, parse_stream_json_lines, AsyncMessageReader,
    MessageJsonlFileReader, MessageJsonlReader, MessageRecord, StreamJsonLine,
    StreamJsonLineOutcome, StreamJsonParser,
};

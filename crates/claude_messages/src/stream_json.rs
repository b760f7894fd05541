use std::{io::BufRead, path::Path};

use serde_json::Value;
use tokio::io::AsyncBufRead;
use tracing::debug;

use crate::{
    reader::{read_bounded_line, read_bounded_line_async, BoundedLine, DEFAULT_MAX_LINE_BYTES},
    Message, MessageParseError, MessageParser, MessageStreamError,
};

/// Line-oriented front end for [`MessageParser`].
#[derive(Debug, Clone, Default)]
pub struct StreamJsonParser {
    parser: MessageParser,
}

impl StreamJsonParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parser(parser: MessageParser) -> Self {
        Self { parser }
    }

    pub fn message_parser(&self) -> &MessageParser {
        &self.parser
    }

    /// Parses a single stream-json line.
    ///
    /// - Returns `Ok(None)` for blank lines and for message kinds the parser skips.
    /// - Returns `Ok(Some(Message))` for decoded known kinds.
    /// - Returns `Err` for invalid JSON and for malformed known kinds.
    pub fn parse_line(&self, line: &str) -> Result<Option<Message>, MessageParseError> {
        let line = line.trim_end_matches('\r');
        if line.chars().all(|ch| ch.is_whitespace()) {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(line).map_err(MessageParseError::json_parse)?;
        self.parser.parse(&value)
    }

    pub fn parse_json(&self, value: &Value) -> Result<Option<Message>, MessageParseError> {
        self.parser.parse(value)
    }

    /// Parses a whole stream-json transcript.
    ///
    /// Lines whose message kind is skipped produce no outcome at all; the relative
    /// order of every other line is preserved.
    pub fn parse_lines(&self, text: &str) -> Vec<StreamJsonLineOutcome> {
        let mut out = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line_number = idx + 1;
            let raw = raw.trim_end_matches('\r');
            if raw.trim().is_empty() {
                continue;
            }
            let line = StreamJsonLine {
                line_number,
                raw: raw.to_string(),
            };
            match self.parse_line(&line.raw) {
                Ok(Some(message)) => out.push(StreamJsonLineOutcome::Ok { line, message }),
                Ok(None) => {}
                Err(error) => out.push(StreamJsonLineOutcome::Err { line, error }),
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct StreamJsonLine {
    pub line_number: usize,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub enum StreamJsonLineOutcome {
    Ok {
        line: StreamJsonLine,
        message: Message,
    },
    Err {
        line: StreamJsonLine,
        error: MessageParseError,
    },
}

/// Parses a whole stream-json transcript with the default parser.
///
/// See [`StreamJsonParser::parse_lines`].
pub fn parse_stream_json_lines(text: &str) -> Vec<StreamJsonLineOutcome> {
    StreamJsonParser::new().parse_lines(text)
}

#[derive(Debug)]
pub struct MessageRecord {
    /// 1-based line number in the underlying source.
    pub line_number: usize,
    pub outcome: Result<Message, MessageStreamError>,
}

fn parse_record(
    parser: &StreamJsonParser,
    line_number: usize,
    line: &str,
) -> Option<MessageRecord> {
    match parser.parse_line(line) {
        Ok(None) => {
            debug!(line_number, "no message produced for line");
            None
        }
        Ok(Some(message)) => Some(MessageRecord {
            line_number,
            outcome: Ok(message),
        }),
        Err(source) => Some(fault_record(line_number, source)),
    }
}

fn fault_record(line_number: usize, source: MessageParseError) -> MessageRecord {
    MessageRecord {
        line_number,
        outcome: Err(MessageStreamError::Parse {
            line_number,
            source,
        }),
    }
}

/// Turns one bounded read into a record; `None` means the line produced nothing.
fn record_for_line(
    parser: &StreamJsonParser,
    line_number: usize,
    line: BoundedLine,
    bytes: &[u8],
    max_line_bytes: usize,
) -> Option<MessageRecord> {
    match line {
        BoundedLine::Eof => None,
        BoundedLine::LineTooLong { observed_bytes } => {
            debug!(line_number, observed_bytes, max_line_bytes, "line over byte cap");
            Some(fault_record(
                line_number,
                MessageParseError::line_too_long(observed_bytes, max_line_bytes),
            ))
        }
        BoundedLine::Line => match std::str::from_utf8(bytes) {
            Ok(text) => parse_record(parser, line_number, text),
            Err(err) => Some(fault_record(line_number, MessageParseError::invalid_utf8(err))),
        },
    }
}

/// Iterator over the messages in a stream-json reader.
///
/// Skipped kinds and blank lines are consumed silently. A malformed line (bad
/// UTF-8, over the byte cap, invalid JSON, schema violation) yields an error
/// record and iteration continues; a read failure yields one error record and
/// ends iteration.
pub struct MessageJsonlReader<R: BufRead> {
    reader: R,
    parser: StreamJsonParser,
    max_line_bytes: usize,
    line_number: usize,
    buffer: Vec<u8>,
    done: bool,
}

impl<R: BufRead> MessageJsonlReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_parser(reader, MessageParser::default())
    }

    pub fn with_parser(reader: R, parser: MessageParser) -> Self {
        Self {
            reader,
            parser: StreamJsonParser::with_parser(parser),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            line_number: 0,
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Caps the bytes kept for a single line; longer lines become `LineTooLong` faults.
    pub fn max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Consumes the iterator and returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> Iterator for MessageJsonlReader<R> {
    type Item = MessageRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line_number = self.line_number.saturating_add(1);

            match read_bounded_line(&mut self.reader, &mut self.buffer, self.max_line_bytes) {
                Ok(BoundedLine::Eof) => {
                    self.done = true;
                    return None;
                }
                Ok(line) => {
                    self.line_number = line_number;
                    if let Some(record) = record_for_line(
                        &self.parser,
                        line_number,
                        line,
                        &self.buffer,
                        self.max_line_bytes,
                    ) {
                        return Some(record);
                    }
                }
                Err(err) => {
                    self.done = true;
                    self.line_number = line_number;
                    return Some(MessageRecord {
                        line_number,
                        outcome: Err(MessageStreamError::Io(err)),
                    });
                }
            }
        }
    }
}

pub type MessageJsonlFileReader = MessageJsonlReader<std::io::BufReader<std::fs::File>>;

/// Convenience constructor for reader-backed parsing.
pub fn message_jsonl_reader<R: BufRead>(reader: R) -> MessageJsonlReader<R> {
    MessageJsonlReader::new(reader)
}

/// Convenience constructor for file-backed parsing.
pub fn message_jsonl_file(
    path: impl AsRef<Path>,
) -> Result<MessageJsonlFileReader, MessageStreamError> {
    let file = std::fs::File::open(path.as_ref())?;
    Ok(MessageJsonlReader::new(std::io::BufReader::new(file)))
}

/// Async counterpart of [`MessageJsonlReader`] for tokio readers, e.g. a child's stdout.
pub struct AsyncMessageReader<R: AsyncBufRead + Unpin> {
    reader: R,
    parser: StreamJsonParser,
    max_line_bytes: usize,
    line_number: usize,
    buffer: Vec<u8>,
    done: bool,
}

impl<R: AsyncBufRead + Unpin> AsyncMessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_parser(reader, MessageParser::default())
    }

    pub fn with_parser(reader: R, parser: MessageParser) -> Self {
        Self {
            reader,
            parser: StreamJsonParser::with_parser(parser),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            line_number: 0,
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Caps the bytes kept for a single line; longer lines become `LineTooLong` faults.
    pub fn max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Returns the next message or fault; `None` once the reader is exhausted.
    pub async fn next_record(&mut self) -> Option<MessageRecord> {
        if self.done {
            return None;
        }

        loop {
            let line_number = self.line_number.saturating_add(1);

            let read =
                read_bounded_line_async(&mut self.reader, &mut self.buffer, self.max_line_bytes)
                    .await;
            match read {
                Ok(BoundedLine::Eof) => {
                    self.done = true;
                    return None;
                }
                Ok(line) => {
                    self.line_number = line_number;
                    if let Some(record) = record_for_line(
                        &self.parser,
                        line_number,
                        line,
                        &self.buffer,
                        self.max_line_bytes,
                    ) {
                        return Some(record);
                    }
                }
                Err(err) => {
                    self.done = true;
                    self.line_number = line_number;
                    return Some(MessageRecord {
                        line_number,
                        outcome: Err(MessageStreamError::Io(err)),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageParseErrorCode;

    #[test]
    fn parser_is_tolerant_and_line_oriented() {
        let parser = StreamJsonParser::new();

        assert!(parser.parse_line("   ").unwrap().is_none());
        assert!(parser
            .parse_line(r#"{"type":"system","subtype":"init"}"#)
            .unwrap()
            .is_some());
        assert!(parser
            .parse_line(r#"{"type":"rate_limit_event"}"#)
            .unwrap()
            .is_none());
        assert_eq!(
            parser.parse_line("{not-json}").unwrap_err().code,
            MessageParseErrorCode::JsonParse
        );
        assert!(parser
            .parse_line("{\"type\":\"system\",\"subtype\":\"x\"}\r")
            .unwrap()
            .is_some());
    }

    #[test]
    fn reader_skips_unknown_kinds_and_continues_past_faults() {
        let input = concat!(
            "{\"type\":\"system\",\"subtype\":\"init\"}\n",
            "\n",
            "{\"type\":\"rate_limit_event\",\"rate_limit_info\":{\"status\":\"rejected\"}}\n",
            "{\"type\":\"result\"}\n",
            "{\"type\":\"system\",\"subtype\":\"done\"}",
        );
        let records: Vec<_> = message_jsonl_reader(std::io::Cursor::new(input)).collect();

        let lines: Vec<_> = records.iter().map(|r| r.line_number).collect();
        assert_eq!(lines, vec![1, 4, 5]);
        assert!(records[0].outcome.is_ok());
        assert!(matches!(
            &records[1].outcome,
            Err(MessageStreamError::Parse { line_number: 4, source })
                if source.code == MessageParseErrorCode::TypedParse
        ));
        assert!(records[2].outcome.is_ok());
    }
}

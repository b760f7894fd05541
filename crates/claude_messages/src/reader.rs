use std::io::{self, BufRead};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Default cap on a single stream-json line.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum BoundedLine {
    Eof,
    /// The line is in the caller's buffer, without its trailing `\n`.
    Line,
    LineTooLong { observed_bytes: usize },
}

/// Accumulates one line across buffer fills, discarding bytes past the cap.
#[derive(Debug)]
pub(crate) struct LineAccumulator {
    max_line_bytes: usize,
    observed_bytes: usize,
    read_any: bool,
}

impl LineAccumulator {
    pub(crate) fn new(max_line_bytes: usize, buffer: &mut Vec<u8>) -> Self {
        buffer.clear();
        Self {
            max_line_bytes,
            observed_bytes: 0,
            read_any: false,
        }
    }

    /// Takes bytes from `available`; returns how many to consume and whether the line ended.
    fn push(&mut self, available: &[u8], buffer: &mut Vec<u8>) -> (usize, bool) {
        self.read_any = true;
        let newline = available.iter().position(|b| *b == b'\n');
        let segment_len = newline.unwrap_or(available.len());

        self.observed_bytes = self.observed_bytes.saturating_add(segment_len);
        if self.observed_bytes > self.max_line_bytes {
            buffer.clear();
        } else {
            buffer.extend_from_slice(&available[..segment_len]);
        }

        match newline {
            Some(idx) => (idx + 1, true),
            None => (available.len(), false),
        }
    }

    fn finish(self) -> BoundedLine {
        if !self.read_any {
            BoundedLine::Eof
        } else if self.observed_bytes > self.max_line_bytes {
            BoundedLine::LineTooLong {
                observed_bytes: self.observed_bytes,
            }
        } else {
            BoundedLine::Line
        }
    }
}

pub(crate) fn read_bounded_line<R: BufRead>(
    reader: &mut R,
    buffer: &mut Vec<u8>,
    max_line_bytes: usize,
) -> io::Result<BoundedLine> {
    let mut acc = LineAccumulator::new(max_line_bytes, buffer);
    loop {
        let (consumed, complete) = {
            let available = match reader.fill_buf() {
                Ok(available) => available,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            if available.is_empty() {
                return Ok(acc.finish());
            }
            acc.push(available, buffer)
        };
        reader.consume(consumed);
        if complete {
            return Ok(acc.finish());
        }
    }
}

pub(crate) async fn read_bounded_line_async<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buffer: &mut Vec<u8>,
    max_line_bytes: usize,
) -> io::Result<BoundedLine> {
    let mut acc = LineAccumulator::new(max_line_bytes, buffer);
    loop {
        let (consumed, complete) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(acc.finish());
            }
            acc.push(available, buffer)
        };
        reader.consume(consumed);
        if complete {
            return Ok(acc.finish());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_line_is_discarded_and_reading_continues() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"ok\n");
        bytes.extend_from_slice(&[b'a'; 50]);
        bytes.extend_from_slice(b"\nnext");

        // Small capacity forces lines to span several fills.
        let mut reader = std::io::BufReader::with_capacity(4, std::io::Cursor::new(bytes));
        let mut buffer = Vec::new();

        assert_eq!(
            read_bounded_line(&mut reader, &mut buffer, 16).unwrap(),
            BoundedLine::Line
        );
        assert_eq!(buffer, b"ok");
        assert_eq!(
            read_bounded_line(&mut reader, &mut buffer, 16).unwrap(),
            BoundedLine::LineTooLong { observed_bytes: 50 }
        );
        assert_eq!(
            read_bounded_line(&mut reader, &mut buffer, 16).unwrap(),
            BoundedLine::Line
        );
        assert_eq!(buffer, b"next");
        assert_eq!(
            read_bounded_line(&mut reader, &mut buffer, 16).unwrap(),
            BoundedLine::Eof
        );
    }

    #[test]
    fn empty_line_is_not_eof() {
        let mut reader = std::io::Cursor::new(b"\n".to_vec());
        let mut buffer = Vec::new();
        assert_eq!(
            read_bounded_line(&mut reader, &mut buffer, 16).unwrap(),
            BoundedLine::Line
        );
        assert!(buffer.is_empty());
        assert_eq!(
            read_bounded_line(&mut reader, &mut buffer, 16).unwrap(),
            BoundedLine::Eof
        );
    }
}

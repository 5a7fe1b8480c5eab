//! Line transport
//!
//! Reads newline-terminated lines from a buffered byte stream. The engine
//! uses it for the REQUEST state, and data handlers pull lines from it
//! directly while they consume a data block.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::time::timeout;

use crate::error::ProtocolError;
use crate::protocol::engine::TelnetOptions;
use crate::protocol::line::Line;

/// The source of lines for one connection.
pub struct Request<'a> {
    reader: Box<dyn AsyncBufRead + Unpin + Send + 'a>,
    max_line_length: usize,
    read_timeout: Option<Duration>,
}

impl<'a> Request<'a> {
    pub fn new<R>(reader: R, options: TelnetOptions) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'a,
    {
        Self {
            reader: Box::new(reader),
            max_line_length: options.max_line_length,
            read_timeout: options.read_timeout,
        }
    }

    /// Reads the next line, stripped of its trailing CR/LF characters.
    ///
    /// Fails if the stream ends before a line terminator, if the line is
    /// longer than the configured maximum, or if no line arrives within the
    /// configured read timeout.
    pub async fn next_line(&mut self) -> Result<Line, ProtocolError> {
        match self.read_timeout {
            Some(after) => timeout(after, self.read_line())
                .await
                .map_err(|_| ProtocolError::Timeout(after))?,
            None => self.read_line().await,
        }
    }

    async fn read_line(&mut self) -> Result<Line, ProtocolError> {
        // room for the CRLF on top of the content
        let limit = self.max_line_length as u64 + 2;
        let mut buf = Vec::new();

        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut buf)
            .await?;

        if n == 0 {
            return Err(ProtocolError::ConnectionClosed);
        }

        if !buf.ends_with(b"\n") {
            if n as u64 >= limit {
                return Err(ProtocolError::LineTooLong(self.max_line_length));
            }
            return Err(ProtocolError::UnterminatedLine);
        }

        // the limit counts raw bytes, before any lossy decoding
        let content = strip_terminator(&buf);
        if content.len() > self.max_line_length {
            return Err(ProtocolError::LineTooLong(self.max_line_length));
        }

        Ok(Line::new(String::from_utf8_lossy(content)))
    }
}

fn strip_terminator(mut bytes: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = bytes {
        bytes = rest;
    }
    bytes
}

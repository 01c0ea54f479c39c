//! Newline-delimited JSON transport.
//!
//! - Each message is one line of UTF-8 JSON
//! - Messages never contain embedded newlines
//! - The reader side receives client messages; the writer side carries only
//!   protocol frames
//!
//! The transport is generic over its streams so sessions can be driven from
//! in-memory buffers. [`StdioTransport`] is the production form.

use std::io;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::mcp::protocol::JsonRpcResponse;

/// Line-oriented message transport over any async reader and writer.
pub struct Transport<R, W> {
    reader: R,
    writer: W,
}

/// The transport used in production: stdin in, stdout out.
pub type StdioTransport = Transport<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

impl StdioTransport {
    /// Creates a transport over the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Transport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a transport over the given streams.
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Consumes the transport and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Reads the next line, without its terminator.
    ///
    /// Returns `None` at end of input. The whole line is consumed even when
    /// it is rejected, so the next call starts on the following line.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails. A line that is not valid UTF-8
    /// yields an [`io::ErrorKind::InvalidData`] error; the stream is still
    /// usable afterwards.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(None);
        }

        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        String::from_utf8(line)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Writes a response as a single line and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        self.write_message(response).await
    }

    /// Serialises any message and writes it as a single line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_message<T: Serialize + ?Sized>(&mut self, message: &T) -> io::Result<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // Compact serde_json output escapes newlines inside strings.
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

//! Transports for twinmcp.
//!
//! A transport is a byte stream carrying newline-delimited JSON frames. The
//! peer consumes it split into two halves: a [`LineSource`] yielding one full
//! line per read, and a [`LineSink`] writing one frame per call (the sink
//! appends the single `\n` delimiter itself).
//!
//! [`StreamTransport`] adapts any async byte stream pair, which covers stdio
//! (subprocess servers), TCP sockets, and in-memory pipes for tests.

#![forbid(unsafe_code)]

mod stream;

pub use stream::{LineReader, LineWriter, StdioTransport, StreamTransport, DEFAULT_MAX_FRAME_LEN};

use async_trait::async_trait;

/// Transport-level error.
#[derive(Debug)]
pub enum TransportError {
    /// The stream reached end-of-input or was closed.
    Closed,
    /// An I/O failure.
    Io(std::io::Error),
    /// A frame exceeded the configured maximum length.
    FrameTooLarge(usize),
    /// An outgoing message failed to serialize.
    Encode(serde_json::Error),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Closed => write!(f, "transport closed"),
            TransportError::Io(e) => write!(f, "I/O error: {e}"),
            TransportError::FrameTooLarge(len) => write!(f, "frame too large: {len} bytes"),
            TransportError::Encode(e) => write!(f, "encode error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            TransportError::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err)
    }
}

/// The read half of a transport: yields one full line per call.
#[async_trait]
pub trait LineSource: Send {
    /// Reads the next non-empty line, without its trailing delimiter.
    ///
    /// Returns `Ok(None)` on clean end-of-stream.
    async fn read_line(&mut self) -> Result<Option<String>, TransportError>;
}

/// The write half of a transport: writes one frame per call.
#[async_trait]
pub trait LineSink: Send {
    /// Writes one frame, appending a single newline, and flushes.
    ///
    /// Safe under concurrent callers when serialized by the owner.
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Flushes and shuts down the write side.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// A pluggable byte-stream transport.
#[async_trait]
pub trait Transport: Send {
    /// Opens the stream. Stream-backed transports are open on construction.
    async fn connect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Splits the transport into its read and write halves.
    fn into_split(self) -> (Box<dyn LineSource>, Box<dyn LineSink>);
}

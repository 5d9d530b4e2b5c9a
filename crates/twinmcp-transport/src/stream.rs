//! Byte-stream transport over any async reader/writer pair.
//!
//! # Wire Format
//!
//! Messages are newline-delimited JSON:
//! - Each frame is a single line terminated by `\n` (LF, not CRLF)
//! - Empty lines are ignored
//! - UTF-8 encoding is required
//! - Lines over the configured maximum length are rejected before parsing

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::{LineSink, LineSource, Transport, TransportError};

/// Default maximum frame length (10 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 10 * 1024 * 1024;

/// The read half: buffered line reader with a frame-length limit.
pub struct LineReader<R> {
    reader: BufReader<R>,
    max_frame_len: usize,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> LineReader<R> {
    /// Creates a line reader with the default frame limit.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            buf: Vec::with_capacity(4096),
        }
    }

    /// Reads one raw line into the internal buffer.
    ///
    /// Returns the number of bytes read; 0 means end-of-stream. The length
    /// limit is enforced while reading so an oversized frame cannot grow the
    /// buffer without bound.
    async fn fill_line(&mut self) -> Result<usize, TransportError> {
        self.buf.clear();
        let mut byte = [0u8; 1];
        loop {
            let n = self.reader.read(&mut byte).await?;
            if n == 0 {
                return Ok(self.buf.len());
            }
            if byte[0] == b'\n' {
                return Ok(self.buf.len() + 1);
            }
            if self.buf.len() >= self.max_frame_len {
                return Err(TransportError::FrameTooLarge(self.buf.len() + 1));
            }
            self.buf.push(byte[0]);
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> LineSource for LineReader<R> {
    async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let read = self.fill_line().await?;
            if read == 0 {
                return Ok(None);
            }

            let line = std::str::from_utf8(&self.buf)
                .map_err(|e| {
                    TransportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
                })?
                .trim_end_matches('\r');

            // Skip blank lines between frames.
            if line.is_empty() {
                continue;
            }
            return Ok(Some(line.to_owned()));
        }
    }
}

/// The write half: writes one frame per call and flushes.
pub struct LineWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> LineWriter<W> {
    /// Creates a line writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> LineSink for LineWriter<W> {
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Transport over any async reader/writer pair.
///
/// The generic shape makes testing straightforward: byte slices implement
/// `AsyncRead` and `Vec<u8>` implements `AsyncWrite`.
pub struct StreamTransport<R, W> {
    reader: LineReader<R>,
    writer: LineWriter<W>,
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Creates a transport over the given reader and writer.
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: LineReader::new(reader),
            writer: LineWriter::new(writer),
        }
    }

    /// Sets the maximum accepted frame length in bytes.
    #[must_use]
    pub fn with_max_frame_len(mut self, len: usize) -> Self {
        self.reader.max_frame_len = len;
        self
    }
}

/// Stdio transport: the primary transport for subprocess servers.
pub type StdioTransport = StreamTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    /// Creates a transport over the process's stdin/stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl StreamTransport<tokio::net::tcp::OwnedReadHalf, tokio::net::tcp::OwnedWriteHalf> {
    /// Creates a transport over an established TCP connection.
    #[must_use]
    pub fn from_tcp(stream: TcpStream) -> Self {
        let (read, write) = stream.into_split();
        Self::new(read, write)
    }
}

#[async_trait]
impl<R, W> Transport for StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn into_split(self) -> (Box<dyn LineSource>, Box<dyn LineSink>) {
        (Box::new(self.reader), Box::new(self.writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_lines_in_sequence() {
        let input: &[u8] = b"{\"a\":1}\n{\"b\":2}\n";
        let mut reader = LineReader::new(input);
        assert_eq!(reader.read_line().await.unwrap().unwrap(), "{\"a\":1}");
        assert_eq!(reader.read_line().await.unwrap().unwrap(), "{\"b\":2}");
        assert!(reader.read_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn skips_empty_lines() {
        let input: &[u8] = b"\n\n{\"a\":1}\n\n{\"b\":2}\n";
        let mut reader = LineReader::new(input);
        assert_eq!(reader.read_line().await.unwrap().unwrap(), "{\"a\":1}");
        assert_eq!(reader.read_line().await.unwrap().unwrap(), "{\"b\":2}");
        assert!(reader.read_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn strips_carriage_returns() {
        let input: &[u8] = b"{\"a\":1}\r\n";
        let mut reader = LineReader::new(input);
        assert_eq!(reader.read_line().await.unwrap().unwrap(), "{\"a\":1}");
    }

    #[tokio::test]
    async fn eof_without_newline_yields_final_line() {
        let input: &[u8] = b"{\"a\":1}";
        let mut reader = LineReader::new(input);
        assert_eq!(reader.read_line().await.unwrap().unwrap(), "{\"a\":1}");
        assert!(reader.read_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_oversized_frames() {
        let input: &[u8] = b"{\"data\":\"xxxxxxxxxxxxxxxx\"}\n";
        let mut reader = LineReader::new(input);
        reader.max_frame_len = 8;
        let err = reader.read_line().await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge(_)));
    }

    #[tokio::test]
    async fn writer_appends_single_newline_per_frame() {
        let mut out = Vec::new();
        {
            let mut writer = LineWriter::new(&mut out);
            writer.write_line("{\"a\":1}").await.unwrap();
            writer.write_line("{\"b\":2}").await.unwrap();
        }
        assert_eq!(out, b"{\"a\":1}\n{\"b\":2}\n");
    }

    #[tokio::test]
    async fn split_roundtrip_over_duplex() {
        let (near, far) = tokio::io::duplex(4096);
        let (near_read, near_write) = tokio::io::split(near);
        let (far_read, far_write) = tokio::io::split(far);

        let (mut near_source, _near_sink) =
            StreamTransport::new(near_read, near_write).into_split();
        let (_far_source, mut far_sink) = StreamTransport::new(far_read, far_write).into_split();

        far_sink.write_line("{\"hello\":true}").await.unwrap();
        assert_eq!(
            near_source.read_line().await.unwrap().unwrap(),
            "{\"hello\":true}"
        );

        drop(far_sink);
        drop(_far_source);
        assert!(near_source.read_line().await.unwrap().is_none());
    }
}

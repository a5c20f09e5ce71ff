// Stream framer: raw connection bytes -> complete, trimmed, non-empty lines.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read size used when the caller does not configure one.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Longest undelimited run kept while waiting for `\n`. Anything past it is
/// discarded so a producer that never sends a delimiter cannot grow the buffer.
pub const MAX_PENDING_BYTES: usize = 64 * 1024;

/// Accumulates partial reads and yields `\n`-terminated lines.
/// Undelimited trailing bytes stay buffered until more data arrives.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: BytesMut,
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(DEFAULT_CHUNK_SIZE),
        }
    }

    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.extend(chunk);
        std::iter::from_fn(|| self.next_line()).collect()
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete line already in the buffer. Empty lines are skipped.
    pub fn next_line(&mut self) -> Option<String> {
        while let Some(nl) = self.buf.iter().position(|&b| b == b'\n') {
            let raw = self.buf.split_to(nl);
            self.buf.advance(1);
            let line = decode_lossy(&raw);
            if !line.is_empty() {
                return Some(line);
            }
        }
        if self.buf.len() > MAX_PENDING_BYTES {
            tracing::warn!(
                discarded_bytes = self.buf.len(),
                "no line delimiter within limit, discarding buffered bytes"
            );
            self.buf.clear();
        }
        None
    }

    /// Bytes held back waiting for a delimiter.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop any undelimited remainder (end of stream).
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// UTF-8 decode with invalid sequences dropped, then whitespace-trimmed.
fn decode_lossy(raw: &[u8]) -> String {
    let text: String = raw.utf8_chunks().map(|chunk| chunk.valid()).collect();
    text.trim().to_string()
}

/// Pulls lines from an async byte source through a [`LineFramer`].
pub struct LineReader<R> {
    reader: R,
    framer: LineFramer,
    chunk: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            framer: LineFramer::new(),
            chunk: vec![0u8; chunk_size.max(1)],
        }
    }

    /// Next complete line, or `Ok(None)` once the peer closed the stream.
    /// A partial line pending at end of stream is discarded, never returned.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(line) = self.framer.next_line() {
                return Ok(Some(line));
            }
            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                if self.framer.pending() > 0 {
                    tracing::debug!(
                        discarded_bytes = self.framer.pending(),
                        "dropping undelimited remainder at end of stream"
                    );
                }
                self.framer.clear();
                return Ok(None);
            }
            self.framer.extend(&self.chunk[..n]);
        }
    }
}

//! Byte-stream reader that yields `CRLF`/`LF`-terminated command lines out of
//! a bounded accumulator buffer. The protocol is byte-oriented: non-UTF-8
//! bytes are preserved and only interpreted as text by the caller.

use tokio::io::AsyncReadExt;

use crate::error::SessionError;

/// Default capacity, per spec §3 invariant 5 ("read_buffer never grows
/// beyond its fixed capacity").
pub const DEFAULT_CAPACITY: usize = 4096;

pub struct LineBuffer {
    buf: Vec<u8>,
    capacity: usize,
}

impl LineBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Reads from `reader` until a full line is available and returns it with
    /// the terminator stripped. Returns `Ok(None)` on a clean EOF observed
    /// before any further bytes were appended. Returns `Err` on I/O failure
    /// or when accepting more bytes would exceed `capacity`.
    pub async fn read_line<R>(&mut self, reader: &mut R) -> Result<Option<Vec<u8>>, SessionError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }

            if self.buf.len() >= self.capacity {
                return Err(SessionError::BufferOverflow(self.capacity));
            }

            let mut chunk = [0u8; 1024];
            let max = (self.capacity - self.buf.len()).min(chunk.len());
            let n = reader.read(&mut chunk[..max]).await?;
            if n == 0 {
                return Ok(None);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Extracts and removes the first terminated line from the buffer, if any.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let lf_pos = self.buf.iter().position(|&b| b == b'\n')?;
        let (line_end, consumed) = if lf_pos > 0 && self.buf[lf_pos - 1] == b'\r' {
            (lf_pos - 1, lf_pos + 1)
        } else {
            (lf_pos, lf_pos + 1)
        };

        let line = self.buf[..line_end].to_vec();
        self.buf.copy_within(consumed.., 0);
        self.buf.truncate(self.buf.len() - consumed);
        Some(line)
    }
}

//! Sentinel-delimited framing over any `AsyncRead + AsyncWrite` stream.
//!
//! Frames are not length-prefixed: each one ends with the literal byte
//! sequence `<EOM488965>`. `read_frame` keeps an internal buffer so bytes
//! arriving after the first sentinel in a read are preserved for the next
//! call rather than discarded.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::defaults;
use crate::error::TransportError;

pub const SENTINEL: &[u8] = b"<EOM488965>";

/// Buffers bytes read from a stream and yields sentinel-delimited frames.
///
/// One `FrameReader` is kept per connection; it owns the carry-over buffer
/// between `read_frame` calls so a sentinel that arrives mid-chunk doesn't
/// strand the bytes that follow it.
pub struct FrameReader {
    buf: Vec<u8>,
    max_frame_bytes: usize,
    read_chunk: Vec<u8>,
}

impl FrameReader {
    pub fn new(max_frame_bytes: usize) -> Self {
        FrameReader {
            buf: Vec::new(),
            max_frame_bytes,
            read_chunk: vec![0u8; defaults::shared::read_chunk_bytes()],
        }
    }

    /// Reads the next complete frame, blocking on I/O as needed.
    ///
    /// Returns `Ok(None)` if the peer closed the connection with no partial
    /// frame pending.
    pub async fn read_frame<S>(&mut self, stream: &mut S) -> Result<Option<String>, TransportError>
    where
        S: AsyncRead + Unpin,
    {
        loop {
            if let Some(pos) = find_sentinel(&self.buf) {
                let body = self.buf.drain(..pos + SENTINEL.len()).collect::<Vec<u8>>();
                let body = &body[..body.len() - SENTINEL.len()];
                let frame = String::from_utf8(body.to_vec())
                    .map_err(|_| TransportError::InvalidEncoding)?;
                return Ok(Some(frame));
            }

            if self.buf.len() > self.max_frame_bytes {
                return Err(TransportError::FrameTooLarge {
                    max: self.max_frame_bytes,
                });
            }

            let n = stream.read(&mut self.read_chunk).await?;
            if n == 0 {
                return if self.buf.is_empty() {
                    Ok(None)
                } else {
                    Err(TransportError::PeerClosed)
                };
            }
            self.buf.extend_from_slice(&self.read_chunk[..n]);
        }
    }
}

fn find_sentinel(buf: &[u8]) -> Option<usize> {
    buf.windows(SENTINEL.len()).position(|w| w == SENTINEL)
}

/// Writes a single sentinel-terminated frame.
pub async fn write_frame<S>(stream: &mut S, body: &str) -> Result<(), TransportError>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(body.as_bytes()).await?;
    stream.write_all(SENTINEL).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn reads_single_frame() {
        let mut stream = Cursor::new(b"hello<EOM488965>".to_vec());
        let mut reader = FrameReader::new(1024);
        let frame = reader.read_frame(&mut stream).await.unwrap();
        assert_eq!(frame.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn preserves_bytes_after_sentinel() {
        let mut stream = Cursor::new(b"first<EOM488965>second<EOM488965>".to_vec());
        let mut reader = FrameReader::new(1024);
        let first = reader.read_frame(&mut stream).await.unwrap();
        let second = reader.read_frame(&mut stream).await.unwrap();
        assert_eq!(first.as_deref(), Some("first"));
        assert_eq!(second.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn empty_stream_yields_none() {
        let mut stream = Cursor::new(Vec::new());
        let mut reader = FrameReader::new(1024);
        assert!(reader.read_frame(&mut stream).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_frame_errors() {
        let body = vec![b'a'; 32];
        let mut stream = Cursor::new(body);
        let mut reader = FrameReader::new(8);
        let err = reader.read_frame(&mut stream).await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { max: 8 }));
    }

    #[tokio::test]
    async fn write_frame_appends_sentinel() {
        let mut out = Vec::new();
        write_frame(&mut out, "hello").await.unwrap();
        assert_eq!(out, b"hello<EOM488965>");
    }
}

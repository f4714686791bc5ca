//! `Content-Length` framing for JSON-RPC over stdio.
//!
//! Every message is `Content-Length: N\r\n\r\n` followed by exactly `N` bytes
//! of JSON. [`FrameReader`] and [`FrameWriter`] wrap the two halves of a
//! language server's pipes.

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Maximum frame size (4 MiB) to prevent unbounded memory allocation.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("missing Content-Length header")]
    MissingLength,
    #[error("Content-Length of zero")]
    ZeroLength,
    #[error("invalid Content-Length value {0:?}")]
    InvalidLength(String),
    #[error("Content-Length {0} exceeds maximum {MAX_FRAME_BYTES}")]
    Oversized(usize),
    #[error("unexpected EOF while reading headers")]
    TruncatedHeaders,
    #[error("frame I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON in frame: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` on EOF before any header byte (the peer closed the
    /// pipe between messages). EOF anywhere else is an error.
    pub async fn read_frame(&mut self) -> Result<Option<serde_json::Value>, FrameError> {
        let Some(content_length) = self.read_headers().await? else {
            return Ok(None);
        };

        if content_length == 0 {
            return Err(FrameError::ZeroLength);
        }
        if content_length > MAX_FRAME_BYTES {
            return Err(FrameError::Oversized(content_length));
        }

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body).await?;

        Ok(Some(serde_json::from_slice(&body)?))
    }

    async fn read_headers(&mut self) -> Result<Option<usize>, FrameError> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();
        let mut saw_any_header_bytes = false;

        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                if saw_any_header_bytes {
                    return Err(FrameError::TruncatedHeaders);
                }
                return Ok(None);
            }
            saw_any_header_bytes = true;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            if key.trim().eq_ignore_ascii_case("Content-Length") {
                let value = value.trim();
                let len = value
                    .parse()
                    .map_err(|_| FrameError::InvalidLength(value.to_string()))?;
                content_length = Some(len);
            }
        }

        content_length.map(Some).ok_or(FrameError::MissingLength)
    }
}

pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serialize `msg`, prefix the byte-length header, and flush.
    pub async fn write_frame<T: Serialize>(&mut self, msg: &T) -> Result<(), FrameError> {
        let body = serde_json::to_vec(msg)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(&body).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

//! Message framing for length-prefixed protocol
//!
//! Each JSON message travels as `[4 bytes little-endian length][payload]`
//! on a bidirectional stream.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Errors that can occur during message framing
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Message too large: {0} bytes (max {1})")]
    MessageTooLarge(usize, usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl FramingError {
    /// True for a clean or abrupt peer close, as opposed to a protocol fault
    pub fn is_closed(&self) -> bool {
        match self {
            FramingError::ConnectionClosed => true,
            FramingError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            FramingError::MessageTooLarge(..) => false,
        }
    }
}

fn eof_as_closed(e: io::Error) -> FramingError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        FramingError::ConnectionClosed
    } else {
        FramingError::Io(e)
    }
}

/// Read one frame, rejecting payloads over `max_len`
pub async fn read_message<R: AsyncRead + Unpin>(
    stream: &mut R,
    max_len: usize,
) -> Result<Vec<u8>, FramingError> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await.map_err(eof_as_closed)?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > max_len {
        return Err(FramingError::MessageTooLarge(len, max_len));
    }
    if len == 0 {
        return Ok(Vec::new());
    }

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await.map_err(eof_as_closed)?;
    Ok(buf)
}

/// Write one frame and flush
pub async fn write_message<W: AsyncWrite + Unpin>(
    stream: &mut W,
    data: &[u8],
    max_len: usize,
) -> Result<(), FramingError> {
    if data.len() > max_len {
        return Err(FramingError::MessageTooLarge(data.len(), max_len));
    }
    stream.write_all(&(data.len() as u32).to_le_bytes()).await?;
    stream.write_all(data).await?;
    stream.flush().await?;
    Ok(())
}

/// Prefix `data` with its length, for callers that batch writes
pub fn frame(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 4);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

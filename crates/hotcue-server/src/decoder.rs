//! Incremental decoder for a stream of concatenated JSON hotcue events.
//!
//! The wire carries no framing beyond JSON value boundaries, so the decoder
//! buffers bytes until `serde_json` can complete one value, yields it, and
//! keeps whatever follows for the next call.

use bytes::{Buf, BytesMut};
use hotcue_core::HotcueEvent;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Bytes requested from the socket per read.
pub const READ_CHUNK_BYTES: usize = 16 * 1024;

/// Largest single event accepted before the connection is dropped.
pub const MAX_EVENT_BYTES: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed event: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("stream ended inside an event")]
    Truncated,
}

pub struct EventDecoder<R> {
    reader: R,
    buf: BytesMut,
    limit: usize,
}

impl<R: AsyncRead + Unpin> EventDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_EVENT_BYTES)
    }

    pub fn with_limit(reader: R, limit: usize) -> Self {
        Self {
            reader,
            buf: BytesMut::with_capacity(READ_CHUNK_BYTES),
            limit,
        }
    }

    /// Next event, or `Ok(None)` on a clean end of stream.
    pub async fn next_event(&mut self) -> Result<Option<HotcueEvent>, DecodeError> {
        loop {
            if let Some(event) = self.try_decode()? {
                return Ok(Some(event));
            }
            if self.buf.len() > self.limit {
                return Err(DecodeError::TooLarge { limit: self.limit });
            }

            self.buf.reserve(READ_CHUNK_BYTES);
            if self.reader.read_buf(&mut self.buf).await? == 0 {
                return if self.buf.iter().all(u8::is_ascii_whitespace) {
                    Ok(None)
                } else {
                    Err(DecodeError::Truncated)
                };
            }
        }
    }

    /// Decode one complete value from the front of the buffer if there is one.
    fn try_decode(&mut self) -> Result<Option<HotcueEvent>, DecodeError> {
        let mut stream =
            serde_json::Deserializer::from_slice(&self.buf).into_iter::<HotcueEvent>();
        match stream.next() {
            Some(Ok(event)) => {
                let consumed = stream.byte_offset();
                self.buf.advance(consumed);
                Ok(Some(event))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => Err(e.into()),
            None => {
                // Only whitespace so far.
                self.buf.clear();
                Ok(None)
            }
        }
    }
}

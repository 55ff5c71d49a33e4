//! gRPC length-prefixed message framing
//!
//! Every message on a gRPC stream is preceded by a 5-byte prefix: one
//! compression flag byte and a big-endian `u32` payload length.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::{Stream, StreamExt};
use thiserror::Error;

use crate::codec::Frame;

pub const PREFIX_LEN: usize = 5;

/// Largest payload accepted from a client (matches the gRPC default receive limit)
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("message of {0} bytes is shorter than the 5-byte prefix")]
    TooShort(usize),

    #[error("declared length {declared} exceeds the {available} bytes available")]
    Truncated { declared: usize, available: usize },

    #[error("message length {0} exceeds the limit of {MAX_FRAME_LEN} bytes")]
    TooLarge(usize),

    #[error("compressed messages are not supported")]
    Compressed,

    #[error("request body error: {0}")]
    Body(String),
}

/// Prefix `payload` with an uncompressed gRPC message header
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(PREFIX_LEN + payload.len());
    buf.put_u8(0);
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// Splits a request body into frames, however the body happens to be chunked
pub struct FrameReader<S> {
    body: S,
    buf: BytesMut,
    frames_read: usize,
}

impl<S, E> FrameReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    pub fn new(body: S) -> Self {
        Self {
            body,
            buf: BytesMut::new(),
            frames_read: 0,
        }
    }

    /// Next complete frame, or `None` once the body ends on a frame boundary
    ///
    /// An empty body still counts as a short first message.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        loop {
            if let Some(frame) = self.split_frame()? {
                self.frames_read += 1;
                return Ok(Some(frame));
            }
            match self.body.next().await {
                Some(Ok(chunk)) => self.buf.extend_from_slice(&chunk),
                Some(Err(e)) => return Err(FrameError::Body(e.to_string())),
                None if self.buf.is_empty() && self.frames_read > 0 => return Ok(None),
                None if self.buf.len() < PREFIX_LEN => {
                    return Err(FrameError::TooShort(self.buf.len()))
                }
                None => {
                    return Err(FrameError::Truncated {
                        declared: declared_len(&self.buf),
                        available: self.buf.len() - PREFIX_LEN,
                    })
                }
            }
        }
    }

    /// Turn the reader into a stream of frames; errors end the stream
    pub fn into_stream(self) -> impl Stream<Item = Result<Frame, FrameError>> + Send
    where
        S: Send,
    {
        futures::stream::unfold(Some(self), |reader| async move {
            let mut reader = reader?;
            match reader.next_frame().await {
                Ok(Some(frame)) => Some((Ok(frame), Some(reader))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    fn split_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        if self.buf.len() < PREFIX_LEN {
            return Ok(None);
        }
        if self.buf[0] != 0 {
            return Err(FrameError::Compressed);
        }
        let len = declared_len(&self.buf);
        if len > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge(len));
        }
        if self.buf.len() < PREFIX_LEN + len {
            return Ok(None);
        }
        self.buf.advance(PREFIX_LEN);
        Ok(Some(Frame::new(self.buf.split_to(len).freeze())))
    }
}

fn declared_len(buf: &[u8]) -> usize {
    u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize
}

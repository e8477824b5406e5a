//! Newline framing over a continuous byte stream.
//!
//! Transports deliver bytes in whatever chunks the network chooses. The
//! decoder accumulates them and yields a frame only once its terminator has
//! been observed; anything after the last terminator stays buffered for the
//! next [`FrameDecoder::feed`]. Frames that are empty or contain only
//! whitespace are dropped silently.

use serde::Serialize;
use thiserror::Error;

/// Byte that terminates every frame on the wire.
///
/// Compact JSON never contains a raw newline (newlines inside strings are
/// escaped), so the terminator cannot occur inside a well-formed frame.
pub const TERMINATOR: u8 = b'\n';

/// Errors raised while encoding or interpreting a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame bytes were not valid UTF-8.
    #[error("frame is not valid UTF-8: {source}")]
    InvalidUtf8 {
        /// Underlying decoding error.
        #[source]
        source: std::str::Utf8Error,
    },
    /// The frame was not a JSON document of the expected shape.
    #[error("malformed frame: {source}")]
    Malformed {
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// The outbound message could not be serialised.
    #[error("failed to serialise frame: {source}")]
    Serialise {
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
}

/// Incremental decoder owning the read buffer of one connection.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    // Bytes before this offset are known to hold no terminator.
    search_from: usize,
}

impl FrameDecoder {
    /// Creates a decoder with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` to the buffer and returns the complete frames now
    /// available, oldest first.
    ///
    /// The returned iterator is lazy: frames are cut from the buffer as they
    /// are pulled. Frames not pulled before the iterator is dropped remain
    /// buffered and are yielded by the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Frames<'_> {
        self.buffer.extend_from_slice(bytes);
        Frames {
            decoder: self,
            consumed: 0,
        }
    }

    /// Bytes received that do not yet form a complete frame.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns `true` when no partial frame is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Lazy sequence of complete frames produced by [`FrameDecoder::feed`].
///
/// Each item is the raw frame content without its terminator.
#[derive(Debug)]
pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
    consumed: usize,
}

impl Iterator for Frames<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.decoder.search_from.max(self.consumed);
            let Some(offset) = self
                .decoder
                .buffer
                .get(start..)
                .and_then(|rest| rest.iter().position(|byte| *byte == TERMINATOR))
            else {
                self.decoder.search_from = self.decoder.buffer.len();
                return None;
            };

            let end = start + offset;
            let frame = self
                .decoder
                .buffer
                .get(self.consumed..end)
                .map(<[u8]>::to_vec)
                .unwrap_or_default();
            self.consumed = end + 1;
            self.decoder.search_from = self.consumed;

            if frame.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Some(frame);
        }
    }
}

impl Drop for Frames<'_> {
    fn drop(&mut self) {
        self.decoder.buffer.drain(..self.consumed);
        self.decoder.search_from = self.decoder.search_from.saturating_sub(self.consumed);
    }
}

/// Serialises `message` as compact JSON followed by exactly one terminator.
///
/// # Errors
///
/// Returns [`FrameError::Serialise`] when the message cannot be represented
/// as JSON.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, FrameError> {
    let mut bytes =
        serde_json::to_vec(message).map_err(|source| FrameError::Serialise { source })?;
    bytes.push(TERMINATOR);
    Ok(bytes)
}

#[cfg(test)]
mod tests;

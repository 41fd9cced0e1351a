//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! Byte-stream tokeniser.
//!
//! Turns a growing `BytesMut` fed from the socket into discrete frames,
//! handling short reads (accumulate until `length` bytes are present) and
//! coalesced frames (drain a frame, check for another, repeat) per spec
//! §4.A. The two framing shapes — the untyped startup-phase frame and the
//! typed message-phase frame — share nothing but "length-prefixed", so they
//! get separate `try_take_*` methods rather than one polymorphic one.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::ProtocolError;

/// Accumulates bytes read from the socket and slices off complete frames.
pub struct FrameReader {
    buf: BytesMut,
}

impl FrameReader {
    pub fn new() -> Self {
        FrameReader {
            buf: BytesMut::with_capacity(8 * 1024),
        }
    }

    /// Append freshly-read bytes to the accumulation buffer.
    pub fn feed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Try to slice off one startup-phase frame: `int32 length |
    /// payload[length-4]`. Returns `Ok(None)` if fewer than `length` bytes
    /// have arrived yet — the caller should read more and retry.
    pub fn try_take_startup(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        if self.buf.len() < 4 {
            return Ok(None);
        }
        let len = i32::from_be_bytes(self.buf[0..4].try_into().unwrap());
        if len < 4 {
            return Err(ProtocolError::InvalidLength(len));
        }
        let len = len as usize;
        if self.buf.len() < len {
            return Ok(None);
        }
        let mut frame = self.buf.split_to(len);
        frame.advance(4);
        Ok(Some(frame.freeze()))
    }

    /// Try to slice off one message-phase frame: `byte1 type | int32 length
    /// | payload[length-4]`. Returns the type byte and the payload (the
    /// length field itself is not included in the payload).
    pub fn try_take_message(&mut self) -> Result<Option<(u8, Bytes)>, ProtocolError> {
        if self.buf.len() < 5 {
            return Ok(None);
        }
        let type_byte = self.buf[0];
        let len = i32::from_be_bytes(self.buf[1..5].try_into().unwrap());
        if len < 4 {
            return Err(ProtocolError::InvalidLength(len));
        }
        let total = 1 + len as usize;
        if self.buf.len() < total {
            return Ok(None);
        }
        let mut frame = self.buf.split_to(total);
        frame.advance(5);
        Ok(Some((type_byte, frame.freeze())))
    }

    /// True if there are no unconsumed bytes buffered (used by tests to
    /// assert a full frame was consumed, no more, no less).
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

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

//! Error taxonomy for the proxy.
//!
//! Mirrors the plain-enum-plus-hand-rolled-`Display` shape the rest of this
//! codebase (and the engine it was adapted from) uses instead of reaching
//! for a derive-macro error crate: each layer gets its own enum, and
//! `ProxyError` unifies them for the one place (the session loop) that
//! needs to turn any of them into a wire `ErrorResponse`.

use std::fmt;

/// Errors raised while tokenising or parsing the wire byte stream.
#[derive(Debug)]
pub enum ProtocolError {
    /// A length field was smaller than the minimum it must include (itself).
    InvalidLength(i32),
    /// The startup packet carried a code we don't recognise.
    UnknownStartupCode(i32),
    /// A message carried a type byte we don't dispatch.
    UnknownMessageType(u8),
    /// A NUL-terminated string ran off the end of the payload.
    Truncated,
    /// A string field was not valid UTF-8.
    InvalidUtf8,
    /// A format code was neither 0 (text) nor 1 (binary).
    InvalidFormatCode(i16),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidLength(n) => write!(f, "invalid frame length: {n}"),
            ProtocolError::UnknownStartupCode(c) => write!(f, "unknown startup code: {c}"),
            ProtocolError::UnknownMessageType(t) => {
                write!(f, "unknown message type: {:?}", *t as char)
            }
            ProtocolError::Truncated => write!(f, "message payload truncated"),
            ProtocolError::InvalidUtf8 => write!(f, "string field is not valid UTF-8"),
            ProtocolError::InvalidFormatCode(c) => write!(f, "invalid format code: {c}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// SQLSTATE-tagged errors that can be surfaced to the client mid-session.
#[derive(Debug)]
pub enum ProxyError {
    /// Fatal framing problem; the session must close.
    Protocol(ProtocolError),
    /// The client sent messages out of sequence (e.g. Bind before Parse).
    Desync(String),
    /// The analytic store rejected or failed to run a query.
    Backend(String),
    /// A store column type has no Postgres-wire equivalent.
    UnsupportedType(String),
}

impl ProxyError {
    /// The SQLSTATE code to report for this error class in `ErrorResponse`.
    pub fn sqlstate(&self) -> &'static str {
        match self {
            ProxyError::Protocol(_) => "08P01",
            ProxyError::Desync(_) => "08P01",
            ProxyError::Backend(_) => "58000",
            ProxyError::UnsupportedType(_) => "0A000",
        }
    }

    /// Whether this error must tear down the whole session, as opposed to
    /// just failing the current query cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProxyError::Protocol(_))
    }
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Protocol(e) => write!(f, "protocol error: {e}"),
            ProxyError::Desync(msg) => write!(f, "protocol violation: {msg}"),
            ProxyError::Backend(msg) => write!(f, "backend error: {msg}"),
            ProxyError::UnsupportedType(msg) => write!(f, "unsupported type: {msg}"),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProtocolError> for ProxyError {
    fn from(e: ProtocolError) -> Self {
        ProxyError::Protocol(e)
    }
}

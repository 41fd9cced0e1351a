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

//! Typed parsing of client-to-server frames into `FrontendMessage`.
//!
//! One tagged variant per message kind, dispatched by tag rather than a
//! string-keyed map. Every payload is kept as bytes end to end; the only
//! place text is decoded is the SQL string itself, handed to callers as
//! `String`.

use bytes::Buf;

use crate::error::ProtocolError;

pub const STARTUP_CODE: i32 = 196608;
pub const SSL_REQUEST_CODE: i32 = 80877103;
pub const CANCEL_REQUEST_CODE: i32 = 80877102;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescribeKind {
    Statement,
    Portal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendMessage {
    Startup {
        major: u16,
        minor: u16,
        params: Vec<(String, String)>,
    },
    SslRequest,
    CancelRequest {
        pid: i32,
        secret: i32,
    },
    Password {
        bytes: Vec<u8>,
    },
    Query {
        sql: String,
    },
    Parse {
        stmt_name: String,
        sql: String,
        param_oids: Vec<i32>,
    },
    Bind {
        portal: String,
        stmt: String,
        param_formats: Vec<i16>,
        param_values: Vec<Option<Vec<u8>>>,
        result_formats: Vec<i16>,
    },
    Describe {
        kind: DescribeKind,
        name: String,
    },
    Execute {
        portal: String,
        max_rows: i32,
    },
    Sync,
    Terminate,
}

/// Read a NUL-terminated string, advancing `buf` past the NUL.
fn read_cstr(buf: &mut &[u8]) -> Result<String, ProtocolError> {
    let pos = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or(ProtocolError::Truncated)?;
    let s = std::str::from_utf8(&buf[..pos])
        .map_err(|_| ProtocolError::InvalidUtf8)?
        .to_string();
    buf.advance(pos + 1);
    Ok(s)
}

fn require(buf: &[u8], n: usize) -> Result<(), ProtocolError> {
    if buf.len() < n {
        Err(ProtocolError::Truncated)
    } else {
        Ok(())
    }
}

/// Parse the first, untyped frame of a connection (startup/SSL/cancel).
/// `payload` is the full frame body, i.e. the 4-byte code followed by
/// whatever trails it.
pub fn parse_startup(mut payload: &[u8]) -> Result<FrontendMessage, ProtocolError> {
    require(payload, 4)?;
    let code = payload.get_i32();
    match code {
        SSL_REQUEST_CODE => Ok(FrontendMessage::SslRequest),
        CANCEL_REQUEST_CODE => {
            require(payload, 8)?;
            let pid = payload.get_i32();
            let secret = payload.get_i32();
            Ok(FrontendMessage::CancelRequest { pid, secret })
        }
        STARTUP_CODE => {
            let major = 3u16;
            let minor = 0u16;
            let mut params = Vec::new();
            loop {
                if payload.is_empty() {
                    return Err(ProtocolError::Truncated);
                }
                if payload[0] == 0 {
                    break;
                }
                let name = read_cstr(&mut payload)?;
                let value = read_cstr(&mut payload)?;
                params.push((name, value));
            }
            Ok(FrontendMessage::Startup {
                major,
                minor,
                params,
            })
        }
        other => Err(ProtocolError::UnknownStartupCode(other)),
    }
}

/// Parse a typed message-phase frame.
pub fn parse_message(type_byte: u8, mut payload: &[u8]) -> Result<FrontendMessage, ProtocolError> {
    match type_byte {
        b'p' => Ok(FrontendMessage::Password {
            bytes: payload.to_vec(),
        }),
        b'Q' => {
            let sql = read_cstr(&mut payload)?;
            Ok(FrontendMessage::Query { sql })
        }
        b'P' => {
            let stmt_name = read_cstr(&mut payload)?;
            let sql = read_cstr(&mut payload)?;
            require(payload, 2)?;
            let n = payload.get_i16() as usize;
            require(payload, n * 4)?;
            let mut param_oids = Vec::with_capacity(n);
            for _ in 0..n {
                param_oids.push(payload.get_i32());
            }
            Ok(FrontendMessage::Parse {
                stmt_name,
                sql,
                param_oids,
            })
        }
        b'B' => {
            let portal = read_cstr(&mut payload)?;
            let stmt = read_cstr(&mut payload)?;

            require(payload, 2)?;
            let n_formats = payload.get_i16() as usize;
            require(payload, n_formats * 2)?;
            let mut param_formats = Vec::with_capacity(n_formats);
            for _ in 0..n_formats {
                param_formats.push(payload.get_i16());
            }

            require(payload, 2)?;
            let n_values = payload.get_i16() as usize;
            let mut param_values = Vec::with_capacity(n_values);
            for _ in 0..n_values {
                require(payload, 4)?;
                let len = payload.get_i32();
                if len < 0 {
                    param_values.push(None);
                } else {
                    let len = len as usize;
                    require(payload, len)?;
                    let (value, rest) = payload.split_at(len);
                    param_values.push(Some(value.to_vec()));
                    payload = rest;
                }
            }

            require(payload, 2)?;
            let n_result_formats = payload.get_i16() as usize;
            require(payload, n_result_formats * 2)?;
            let mut result_formats = Vec::with_capacity(n_result_formats);
            for _ in 0..n_result_formats {
                result_formats.push(payload.get_i16());
            }

            Ok(FrontendMessage::Bind {
                portal,
                stmt,
                param_formats,
                param_values,
                result_formats,
            })
        }
        b'D' => {
            require(payload, 1)?;
            let kind = match payload.get_u8() {
                b'S' => DescribeKind::Statement,
                b'P' => DescribeKind::Portal,
                other => return Err(ProtocolError::UnknownMessageType(other)),
            };
            let name = read_cstr(&mut payload)?;
            Ok(FrontendMessage::Describe { kind, name })
        }
        b'E' => {
            let portal = read_cstr(&mut payload)?;
            require(payload, 4)?;
            let max_rows = payload.get_i32();
            Ok(FrontendMessage::Execute { portal, max_rows })
        }
        b'S' => Ok(FrontendMessage::Sync),
        b'X' => Ok(FrontendMessage::Terminate),
        other => Err(ProtocolError::UnknownMessageType(other)),
    }
}

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

//! Shared wire types: column descriptors, cell values, and the fixed
//! synthetic constants this proxy hands out for every connection.

use crate::error::ProtocolError;

/// `tableOid` stamped into every `RowDescription` this proxy emits.
pub const SYNTHETIC_TABLE_OID: i32 = 49152;

/// Fixed salt for `AuthenticationMD5Password`; nothing validates the hash
/// that comes back, so there's no reason for it to vary per connection.
pub const MD5_SALT: [u8; 4] = [0x12, 0x34, 0x56, 0x78];

/// Postgres type OIDs this proxy names directly.
pub mod oid {
    pub const BOOL: i32 = 16;
    pub const CHAR: i32 = 18;
    pub const NAME: i32 = 19;
    pub const INT8: i32 = 20;
    pub const INT2: i32 = 21;
    pub const INT4: i32 = 23;
    pub const TEXT: i32 = 25;
    pub const OID: i32 = 26;
    pub const VARCHAR: i32 = 1043;
}

/// Column format code: text is ASCII, binary is the type-specific network
/// encoding. This proxy only ever hands out pre-formatted text bytes, so
/// `Binary` cells just carry those same bytes verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text = 0,
    Binary = 1,
}

impl Format {
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Result<Self, ProtocolError> {
        match code {
            0 => Ok(Format::Text),
            1 => Ok(Format::Binary),
            other => Err(ProtocolError::InvalidFormatCode(other)),
        }
    }
}

/// One column in a `RowDescription`.
#[derive(Debug, Clone)]
pub struct FieldDescription {
    pub name: String,
    pub table_oid: i32,
    pub col_index: i16,
    pub type_oid: i32,
    pub type_len: i16,
    pub type_mod: i32,
    pub format: Format,
}

impl FieldDescription {
    /// Build a field with the fixed synthetic `tableOid`/`typeMod`,
    /// 1-based `col_index` supplied by the caller in field order.
    pub fn new(name: impl Into<String>, col_index: i16, type_oid: i32, type_len: i16, format: Format) -> Self {
        FieldDescription {
            name: name.into(),
            table_oid: SYNTHETIC_TABLE_OID,
            col_index,
            type_oid,
            type_len,
            type_mod: -1,
            format,
        }
    }
}

/// One cell of a `DataRow`. NULL is a distinct variant so it can round-trip
/// through the wire's `len == -1` encoding with no byte payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Binary(Vec<u8>),
    Null,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }
}

pub type Row = Vec<Cell>;

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

//! The thin contract over the analytic store's connection: `connect`,
//! `execute`, `listTables`, `describeTable`. This module holds that
//! contract plus the one concrete implementation this crate ships — a
//! small length-prefixed JSON request/response protocol standing in for
//! the store's proprietary native protocol, which stays external to this
//! crate.
//!
//! `Backend` is a trait rather than a concrete struct so tests (and
//! `--load`/fixture style startup) can swap in `memory::MemoryBackend`
//! without touching a socket.

pub mod memory;
pub mod net;

use async_trait::async_trait;

use crate::error::ProxyError;
use crate::protocol::types::{oid, Cell, Format};

/// A single result-set column as reported by the store, before Postgres
/// type mapping (`StoreType::classify`/`StoreType::pg_name` do that).
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub type_tag: String,
    pub length: i32,
}

/// A scalar cell value as handed back by the store. `value_to_cell` (this
/// module) turns this into a `protocol::Cell`, text-encoding numbers as
/// the wire format requires.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// The result of `Backend::execute`.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

/// One entry from `Backend::list_tables`.
#[derive(Debug, Clone)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

/// One column from `Backend::describe_table`.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub type_tag: String,
    pub nullable: bool,
}

/// Connection parameters for the analytic store.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub clustered: bool,
}

/// The backend adapter contract. Implementations may hold a single shared
/// connection — the store's native protocol is not multiplexable, so
/// callers serialize access behind `Arc<Mutex<_>>` rather than this trait
/// enforcing it itself.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<ExecResult, String>;
    async fn list_tables(&self) -> Result<Vec<TableRef>, String>;
    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, String>;
}

/// The one store→Postgres type mapping this proxy knows, shared by the
/// two places that need it: the catalog emulator's `data_type` text
/// column (§4.C) and the plain Postgres type OID stamped into a
/// `RowDescription` for a passed-through query's result columns (§4.D).
/// The rule is a plain substring match on the store's own type tag; any
/// tag not covered is a hard error (`0A000`, "feature not supported"),
/// never a silent guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Integer,
    Text,
}

impl StoreType {
    pub fn classify(type_tag: &str) -> Result<Self, ProxyError> {
        if type_tag.contains("int") {
            Ok(StoreType::Integer)
        } else if type_tag.contains("text") {
            Ok(StoreType::Text)
        } else {
            Err(ProxyError::UnsupportedType(type_tag.to_string()))
        }
    }

    /// The name the BI tool's column-info probe expects in its
    /// `data_type` column.
    pub fn pg_name(self) -> &'static str {
        match self {
            StoreType::Integer => "integer",
            StoreType::Text => "text",
        }
    }

    /// `(typeOid, typeLen)` for a `RowDescription` field of this type.
    pub fn oid_and_len(self) -> (i32, i16) {
        match self {
            StoreType::Integer => (oid::INT4, 4),
            StoreType::Text => (oid::TEXT, -1),
        }
    }
}

/// Text-encode one backend cell per §4.A: booleans as `t`/`f`, integers as
/// plain decimal, text raw, NULL as the dedicated wire variant. This proxy
/// never hands out `Cell::Binary` for backend-sourced rows — every path
/// that reaches the wire through `Backend::execute` uses `TEXT` format.
pub fn value_to_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::text(if *b { "t" } else { "f" }),
        Value::Int(i) => Cell::text(i.to_string()),
        Value::Float(f) => Cell::text(f.to_string()),
        Value::Text(s) => Cell::text(s.clone()),
    }
}

/// The format `session::run_against_backend` stamps into every
/// `FieldDescription` for a passed-through query's result columns —
/// `value_to_cell` only ever produces text-encoded cells, so the
/// descriptor must declare `Text` to match.
pub const EXEC_RESULT_FORMAT: Format = Format::Text;

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn classifies_int_and_text_tags_by_substring() {
        assert_eq!(StoreType::classify("ftInt").unwrap(), StoreType::Integer);
        assert_eq!(StoreType::classify("bigint").unwrap(), StoreType::Integer);
        assert_eq!(StoreType::classify("ftVarchar_text").unwrap(), StoreType::Text);
        assert!(StoreType::classify("ftBinary").is_err());
    }

    #[test]
    fn encodes_cells_per_wire_text_rules() {
        assert_eq!(value_to_cell(&Value::Null), Cell::Null);
        assert_eq!(value_to_cell(&Value::Bool(true)), Cell::text("t"));
        assert_eq!(value_to_cell(&Value::Bool(false)), Cell::text("f"));
        assert_eq!(value_to_cell(&Value::Int(-7)), Cell::text("-7"));
        assert_eq!(value_to_cell(&Value::Text("hi".into())), Cell::text("hi"));
    }
}

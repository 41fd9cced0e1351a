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

//! An in-process `Backend` used by tests and by `--load`/`--init` style
//! fixture loading — named tables and canned query results the proxy was
//! told about up front, with no SQL engine behind them at all.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Backend, Column, ColumnInfo, ExecResult, TableRef, Value};

/// A single fixture table: schema plus every row, stored as host-language
/// scalars exactly as `Backend::execute` would hand them back.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

/// A backend whose tables and query results are supplied up front. SELECT
/// statements are matched by exact, case-insensitive SQL text — there is no
/// SQL parser here (that job belongs to the real analytic store) so tests
/// register the queries they intend to send and the rows the fixture
/// should answer with.
pub struct MemoryBackend {
    tables: HashMap<String, MemoryTable>,
    queries: Mutex<HashMap<String, ExecResult>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            tables: HashMap::new(),
            queries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_table(mut self, name: impl Into<String>, table: MemoryTable) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    /// Register the exact result to return for a given SQL string.
    pub async fn stub_query(&self, sql: impl Into<String>, result: ExecResult) {
        self.queries.lock().await.insert(sql.into(), result);
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn execute(&self, sql: &str) -> Result<ExecResult, String> {
        if let Some(result) = self.queries.lock().await.get(sql) {
            return Ok(result.clone());
        }
        Err(format!("no fixture registered for query: {sql}"))
    }

    async fn list_tables(&self) -> Result<Vec<TableRef>, String> {
        Ok(self
            .tables
            .keys()
            .map(|name| TableRef {
                schema: "public".to_string(),
                table: name.clone(),
            })
            .collect())
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, String> {
        let t = self
            .tables
            .get(table)
            .ok_or_else(|| format!("unknown table: {table}"))?;
        Ok(t.columns
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                type_tag: c.type_tag.clone(),
                nullable: true,
            })
            .collect())
    }
}

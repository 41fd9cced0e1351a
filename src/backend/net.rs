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

//! `Backend` implementation that talks to the analytic store over a small
//! length-prefixed JSON request/response protocol.
//!
//! The store's real native protocol is out of scope for this crate (spec
//! §1); this module only needs to be *a* working, serializable transport so
//! the rest of the proxy has something concrete to drive in integration
//! tests and in deployments that front a store speaking this shape. Framing
//! mirrors the same "length-prefixed, accumulate on short read" discipline
//! as `protocol::frame` (component A), just with a JSON payload instead of
//! a Postgres message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use super::{Backend, BackendConfig, Column, ColumnInfo, ExecResult, TableRef, Value};

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum WireRequest<'a> {
    Connect {
        database: &'a str,
        user: &'a str,
        password: &'a str,
        clustered: bool,
    },
    Execute {
        sql: &'a str,
    },
    ListTables,
    DescribeTable {
        table: &'a str,
    },
}

#[derive(Deserialize)]
struct WireColumn {
    name: String,
    type_tag: String,
    length: i32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireCell {
    Null(Option<()>),
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<WireCell> for Value {
    fn from(c: WireCell) -> Self {
        match c {
            WireCell::Null(_) => Value::Null,
            WireCell::Bool(b) => Value::Bool(b),
            WireCell::Int(i) => Value::Int(i),
            WireCell::Float(f) => Value::Float(f),
            WireCell::Text(s) => Value::Text(s),
        }
    }
}

#[derive(Deserialize)]
struct WireTableRef {
    schema: String,
    table: String,
}

#[derive(Deserialize)]
struct WireColumnInfo {
    name: String,
    #[serde(rename = "type")]
    type_tag: String,
    nullable: bool,
}

#[derive(Deserialize, Default)]
struct WireResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    columns: Vec<WireColumn>,
    #[serde(default)]
    rows: Vec<Vec<WireCell>>,
    #[serde(default)]
    tables: Vec<WireTableRef>,
    #[serde(default)]
    table_columns: Vec<WireColumnInfo>,
}

/// Backend adapter that owns one TCP connection to the analytic store,
/// shared across all sessions and serialized behind a mutex — the
/// analytic store's native protocol is not multiplexable on a single
/// connection.
pub struct NetBackend {
    conn: Mutex<TcpStream>,
}

impl NetBackend {
    pub async fn connect(config: &BackendConfig) -> Result<Self, String> {
        let addr = format!("{}:{}", config.host, config.port);
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| format!("connect to {addr}: {e}"))?;

        let req = WireRequest::Connect {
            database: &config.database,
            user: &config.user,
            password: &config.password,
            clustered: config.clustered,
        };
        write_frame(&mut stream, &req).await?;
        let resp: WireResponse = read_frame(&mut stream).await?;
        if !resp.ok {
            return Err(resp.error.unwrap_or_else(|| "connect rejected".to_string()));
        }

        Ok(NetBackend {
            conn: Mutex::new(stream),
        })
    }

    async fn roundtrip(&self, req: &WireRequest<'_>) -> Result<WireResponse, String> {
        let mut conn = self.conn.lock().await;
        write_frame(&mut *conn, req).await?;
        read_frame(&mut *conn).await
    }
}

async fn write_frame(stream: &mut TcpStream, req: &WireRequest<'_>) -> Result<(), String> {
    let body = serde_json::to_vec(req).map_err(|e| e.to_string())?;
    let len = body.len() as u32;
    stream
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|e| e.to_string())?;
    stream.write_all(&body).await.map_err(|e| e.to_string())?;
    stream.flush().await.map_err(|e| e.to_string())
}

async fn read_frame(stream: &mut TcpStream) -> Result<WireResponse, String> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| e.to_string())?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    stream
        .read_exact(&mut body)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::from_slice(&body).map_err(|e| e.to_string())
}

#[async_trait]
impl Backend for NetBackend {
    async fn execute(&self, sql: &str) -> Result<ExecResult, String> {
        let resp = self.roundtrip(&WireRequest::Execute { sql }).await?;
        if !resp.ok {
            return Err(resp.error.unwrap_or_else(|| "execute failed".to_string()));
        }
        Ok(ExecResult {
            columns: resp
                .columns
                .into_iter()
                .map(|c| Column {
                    name: c.name,
                    type_tag: c.type_tag,
                    length: c.length,
                })
                .collect(),
            rows: resp
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(Value::from).collect())
                .collect(),
        })
    }

    async fn list_tables(&self) -> Result<Vec<TableRef>, String> {
        let resp = self.roundtrip(&WireRequest::ListTables).await?;
        if !resp.ok {
            return Err(resp.error.unwrap_or_else(|| "list_tables failed".to_string()));
        }
        Ok(resp
            .tables
            .into_iter()
            .map(|t| TableRef {
                schema: t.schema,
                table: t.table,
            })
            .collect())
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, String> {
        let resp = self
            .roundtrip(&WireRequest::DescribeTable { table })
            .await?;
        if !resp.ok {
            return Err(resp
                .error
                .unwrap_or_else(|| "describe_table failed".to_string()));
        }
        Ok(resp
            .table_columns
            .into_iter()
            .map(|c| ColumnInfo {
                name: c.name,
                type_tag: c.type_tag,
                nullable: c.nullable,
            })
            .collect())
    }
}

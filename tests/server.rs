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

//! End-to-end tests driving the accept loop with a real `tokio_postgres`
//! client over a loopback socket, backed by an in-process `MemoryBackend`
//! fixture rather than a live analytic store.

use std::sync::Arc;

use pgshim::backend::memory::{MemoryBackend, MemoryTable};
use pgshim::backend::{Column, ExecResult, Value};
use tokio::net::TcpListener;

/// Start the server on an ephemeral loopback port and return the address
/// it bound to. The server task is leaked into the background — the test
/// process tearing down is what ends it.
async fn start_server(backend: MemoryBackend) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let backend: Arc<dyn pgshim::backend::Backend> = Arc::new(backend);
    tokio::spawn(async move {
        pgshim::server::serve_on(listener, backend).await.unwrap();
    });
    addr
}

async fn connect(addr: std::net::SocketAddr) -> tokio_postgres::Client {
    let conn_str = format!(
        "host={} port={} user=postgres dbname=postgres",
        addr.ip(),
        addr.port()
    );
    let (client, connection) = tokio_postgres::connect(&conn_str, tokio_postgres::NoTls)
        .await
        .unwrap();
    tokio::spawn(async move {
        let _ = connection.await;
    });
    client
}

#[tokio::test]
async fn handshake_and_simple_select() {
    let backend = MemoryBackend::new();
    backend
        .stub_query(
            "select * from test1",
            ExecResult {
                columns: vec![Column {
                    name: "xint".to_string(),
                    type_tag: "int".to_string(),
                    length: 4,
                }],
                rows: vec![vec![Value::Int(1)], vec![Value::Int(2)]],
            },
        )
        .await;
    let addr = start_server(backend).await;
    let client = connect(addr).await;

    let rows = client.simple_query("select * from test1").await.unwrap();
    let data_rows: Vec<_> = rows
        .iter()
        .filter_map(|m| match m {
            tokio_postgres::SimpleQueryMessage::Row(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(data_rows.len(), 2);
    assert_eq!(data_rows[0].get(0), Some("1"));
    assert_eq!(data_rows[1].get(0), Some("2"));
}

#[tokio::test]
async fn catalog_character_set_probe() {
    let backend = MemoryBackend::new();
    let addr = start_server(backend).await;
    let client = connect(addr).await;

    let rows = client
        .simple_query("select character_set_name from INFORMATION_SCHEMA.character_sets")
        .await
        .unwrap();
    let data_rows: Vec<_> = rows
        .iter()
        .filter_map(|m| match m {
            tokio_postgres::SimpleQueryMessage::Row(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(data_rows.len(), 1);
    assert_eq!(data_rows[0].get(0), Some("UTF8"));
}

#[tokio::test]
async fn catalog_table_list_probe_reflects_registered_tables() {
    let backend = MemoryBackend::new().with_table(
        "orders",
        MemoryTable {
            columns: vec![],
            rows: vec![],
        },
    );
    let addr = start_server(backend).await;
    let client = connect(addr).await;

    let rows = client
        .simple_query(
            "select TABLE_SCHEMA, TABLE_NAME, TABLE_TYPE\r\nfrom INFORMATION_SCHEMA.tables\r\nwhere TABLE_SCHEMA not in ('information_schema', 'pg_catalog')\r\norder by TABLE_SCHEMA, TABLE_NAME",
        )
        .await
        .unwrap();
    let data_rows: Vec<_> = rows
        .iter()
        .filter_map(|m| match m {
            tokio_postgres::SimpleQueryMessage::Row(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(data_rows.len(), 1);
    assert_eq!(data_rows[0].get(1), Some("orders"));
}

#[tokio::test]
async fn discard_all_completes_cleanly() {
    let backend = MemoryBackend::new();
    let addr = start_server(backend).await;
    let client = connect(addr).await;
    client.batch_execute("DISCARD ALL").await.unwrap();
}

#[tokio::test]
async fn backend_error_surfaces_as_sqlstate_internal_error() {
    let backend = MemoryBackend::new();
    let addr = start_server(backend).await;
    let client = connect(addr).await;

    let err = client
        .simple_query("select * from nonexistent")
        .await
        .unwrap_err();
    let db_err = err.as_db_error().expect("expected a database error");
    assert_eq!(
        db_err.code(),
        &tokio_postgres::error::SqlState::from_code("58000")
    );
}

#[tokio::test]
async fn simple_query_fetches_every_row_in_order() {
    let backend = MemoryBackend::new();
    backend
        .stub_query(
            "select * from big",
            ExecResult {
                columns: vec![Column {
                    name: "n".to_string(),
                    type_tag: "int".to_string(),
                    length: 4,
                }],
                rows: (1..=5i64).map(|n| vec![Value::Int(n)]).collect(),
            },
        )
        .await;
    let addr = start_server(backend).await;
    let client = connect(addr).await;

    let rows = client.simple_query("select * from big").await.unwrap();
    let values: Vec<&str> = rows
        .iter()
        .filter_map(|m| match m {
            tokio_postgres::SimpleQueryMessage::Row(r) => r.get(0),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec!["1", "2", "3", "4", "5"]);
}

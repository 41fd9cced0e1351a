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

//! Recognises the reporting tool's catalog-introspection queries and
//! synthesises Postgres-shaped result sets for them instead of forwarding
//! to the analytic store, which has no `pg_catalog` or `information_schema`
//! of its own.

pub mod types;

use crate::backend::{Backend, ColumnInfo, StoreType};
use crate::error::ProxyError;
use crate::protocol::types::{oid, Cell, FieldDescription, Format, Row};

/// The result of a catalog lookup: a row descriptor plus the rows
/// themselves, ready to hand straight to the session's `RowDescription`
/// / `DataRow` emission.
pub struct CatalogResult {
    pub fields: Vec<FieldDescription>,
    pub rows: Vec<Row>,
}

/// Returns true if `sql` is one of the known introspection fingerprints
/// (exact match for five of them, prefix match for the column-info
/// query).
pub fn is_catalog_query(sql: &str) -> bool {
    sql == types::SUPPORTED_TYPES_QUERY
        || sql == types::FIELD_DEF_COMPOSITE_TYPES_QUERY
        || sql == types::ENUM_FIELDS_QUERY
        || sql == types::CHAR_SET_QUERY
        || sql == types::USER_TABLE_LIST_QUERY
        || sql.starts_with(types::COLUMN_INFO_QUERY_PREFIX)
}

/// Resolve a recognised fingerprint into a descriptor and its rows. The
/// three fingerprints that depend on live state (table list, column
/// info) call back into the backend adapter; the rest are static.
///
/// Returns `Ok(None)` if `sql` is not a recognised fingerprint — callers
/// fall back to the backend adapter in that case rather than treating it
/// as an error.
pub async fn resolve(
    sql: &str,
    backend: &dyn Backend,
) -> Result<Option<CatalogResult>, ProxyError> {
    if sql == types::SUPPORTED_TYPES_QUERY {
        return Ok(Some(supported_types()));
    }
    if sql == types::FIELD_DEF_COMPOSITE_TYPES_QUERY {
        return Ok(Some(CatalogResult {
            fields: vec![
                FieldDescription::new("oid", 1, oid::OID, 4, Format::Text),
                FieldDescription::new("attname", 2, oid::NAME, 64, Format::Text),
                FieldDescription::new("atttypid", 3, oid::OID, 4, Format::Text),
            ],
            rows: Vec::new(),
        }));
    }
    if sql == types::ENUM_FIELDS_QUERY {
        return Ok(Some(CatalogResult {
            fields: vec![
                FieldDescription::new("oid", 1, oid::OID, 4, Format::Text),
                FieldDescription::new("enumlabel", 2, oid::NAME, 64, Format::Text),
            ],
            rows: Vec::new(),
        }));
    }
    if sql == types::CHAR_SET_QUERY {
        return Ok(Some(CatalogResult {
            fields: vec![FieldDescription::new(
                "character_set_name",
                1,
                oid::NAME,
                64,
                Format::Binary,
            )],
            rows: vec![vec![Cell::text("UTF8")]],
        }));
    }
    if sql == types::USER_TABLE_LIST_QUERY {
        return Ok(Some(user_table_list(backend).await?));
    }
    if let Some(table) = sql
        .strip_prefix(types::COLUMN_INFO_QUERY_PREFIX)
        .and_then(extract_table_name)
    {
        return Ok(Some(column_info(backend, &table).await?));
    }
    Ok(None)
}

/// Pulls the quoted table name out of `TABLE_NAME = '<name>'`, the only
/// part of the column-info query that varies call to call.
fn extract_table_name(rest_of_query: &str) -> Option<String> {
    let after = rest_of_query.trim_start();
    let after = after.strip_prefix("'")?;
    let end = after.find('\'')?;
    Some(after[..end].to_string())
}

fn supported_types() -> CatalogResult {
    let fields = vec![
        FieldDescription::new("nspname", 1, oid::NAME, 64, Format::Text),
        FieldDescription::new("typname", 2, oid::NAME, 64, Format::Text),
        FieldDescription::new("oid", 3, oid::OID, 4, Format::Text),
        FieldDescription::new("typrelid", 4, oid::OID, 4, Format::Text),
        FieldDescription::new("typbasetype", 5, oid::OID, 4, Format::Text),
        FieldDescription::new("type", 6, oid::CHAR, 1, Format::Text),
        FieldDescription::new("elemoid", 7, oid::OID, 4, Format::Text),
        FieldDescription::new("ord", 8, oid::INT4, 4, Format::Text),
    ];
    let rows = types::SUPPORTED_TYPES
        .iter()
        .map(|(nspname, typname, id, typrelid, typbasetype, kind, elemoid, ord)| {
            vec![
                Cell::text(*nspname),
                Cell::text(*typname),
                Cell::text(id.to_string()),
                Cell::text(typrelid.to_string()),
                Cell::text(typbasetype.to_string()),
                Cell::text(kind.to_string()),
                Cell::text(elemoid.to_string()),
                Cell::text(ord.to_string()),
            ]
        })
        .collect();
    CatalogResult { fields, rows }
}

async fn user_table_list(backend: &dyn Backend) -> Result<CatalogResult, ProxyError> {
    let tables = backend
        .list_tables()
        .await
        .map_err(ProxyError::Backend)?;
    let fields = vec![
        FieldDescription::new("table_schema", 1, oid::NAME, 64, Format::Binary),
        FieldDescription::new("table_name", 2, oid::NAME, 64, Format::Binary),
        FieldDescription::new("table_type", 3, oid::VARCHAR, -1, Format::Binary),
    ];
    let rows = tables
        .into_iter()
        .map(|t| vec![Cell::text(t.schema), Cell::text(t.table), Cell::text("BASE TABLE")])
        .collect();
    Ok(CatalogResult { fields, rows })
}

async fn column_info(backend: &dyn Backend, table: &str) -> Result<CatalogResult, ProxyError> {
    let columns = backend
        .describe_table(table)
        .await
        .map_err(ProxyError::Backend)?;
    let fields = vec![
        FieldDescription::new("column_name", 1, oid::NAME, 64, Format::Binary),
        FieldDescription::new("ordinal_position", 2, oid::INT4, 4, Format::Binary),
        FieldDescription::new("is_nullable", 3, oid::VARCHAR, -1, Format::Binary),
        FieldDescription::new("data_type", 4, oid::VARCHAR, -1, Format::Binary),
    ];
    let mut rows = Vec::with_capacity(columns.len());
    for (index, ColumnInfo { name, type_tag, nullable }) in columns.into_iter().enumerate() {
        let data_type = StoreType::classify(&type_tag)?.pg_name();
        let is_nullable = if nullable { "YES" } else { "NO" };
        rows.push(vec![
            Cell::text(name),
            Cell::text((index + 1).to_string()),
            Cell::text(is_nullable),
            Cell::text(data_type),
        ]);
    }
    Ok(CatalogResult { fields, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryBackend, MemoryTable};
    use crate::backend::Column;

    #[test]
    fn recognises_all_six_fingerprints() {
        assert!(is_catalog_query(types::SUPPORTED_TYPES_QUERY));
        assert!(is_catalog_query(types::FIELD_DEF_COMPOSITE_TYPES_QUERY));
        assert!(is_catalog_query(types::ENUM_FIELDS_QUERY));
        assert!(is_catalog_query(types::CHAR_SET_QUERY));
        assert!(is_catalog_query(types::USER_TABLE_LIST_QUERY));
        assert!(is_catalog_query(&format!(
            "{}'test1'\r\norder by TABLE_SCHEMA, TABLE_NAME, ORDINAL_POSITION",
            types::COLUMN_INFO_QUERY_PREFIX
        )));
        assert!(!is_catalog_query("select * from test1"));
    }

    #[tokio::test]
    async fn supported_types_has_150_rows_and_8_columns() {
        let backend = MemoryBackend::new();
        let result = resolve(types::SUPPORTED_TYPES_QUERY, &backend)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.fields.len(), 8);
        assert_eq!(result.rows.len(), types::SUPPORTED_TYPES.len());
        assert_eq!(result.rows.len(), 150);
    }

    #[tokio::test]
    async fn char_set_query_answers_utf8() {
        let backend = MemoryBackend::new();
        let result = resolve(types::CHAR_SET_QUERY, &backend)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.rows, vec![vec![Cell::text("UTF8")]]);
    }

    #[tokio::test]
    async fn user_table_list_comes_from_backend_list_tables() {
        let backend = MemoryBackend::new().with_table(
            "orders",
            MemoryTable {
                columns: vec![],
                rows: vec![],
            },
        );
        let result = resolve(types::USER_TABLE_LIST_QUERY, &backend)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            result.rows,
            vec![vec![
                Cell::text("public"),
                Cell::text("orders"),
                Cell::text("BASE TABLE"),
            ]]
        );
    }

    #[tokio::test]
    async fn column_info_maps_store_types_and_extracts_table_name() {
        let backend = MemoryBackend::new().with_table(
            "orders",
            MemoryTable {
                columns: vec![
                    Column {
                        name: "id".to_string(),
                        type_tag: "ftInt".to_string(),
                        length: 4,
                    },
                    Column {
                        name: "label".to_string(),
                        type_tag: "ftVarchar".to_string(),
                        length: -1,
                    },
                ],
                rows: vec![],
            },
        );
        let query = format!(
            "{}'orders'\r\norder by TABLE_SCHEMA, TABLE_NAME, ORDINAL_POSITION",
            types::COLUMN_INFO_QUERY_PREFIX
        );
        let result = resolve(&query, &backend).await.unwrap().unwrap();
        assert_eq!(result.rows[0][0], Cell::text("id"));
        assert_eq!(result.rows[0][3], Cell::text("integer"));
        assert_eq!(result.rows[1][3], Cell::text("text"));
    }

    #[tokio::test]
    async fn unsupported_store_type_is_an_error() {
        let backend = MemoryBackend::new().with_table(
            "weird",
            MemoryTable {
                columns: vec![Column {
                    name: "blob".to_string(),
                    type_tag: "ftBinary".to_string(),
                    length: -1,
                }],
                rows: vec![],
            },
        );
        let query = format!(
            "{}'weird'\r\norder by TABLE_SCHEMA, TABLE_NAME, ORDINAL_POSITION",
            types::COLUMN_INFO_QUERY_PREFIX
        );
        assert!(resolve(&query, &backend).await.is_err());
    }
}

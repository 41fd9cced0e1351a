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

//! The per-connection state machine (component B): sequences the
//! startup/authentication handshake and the Simple Query / Extended
//! Query sub-protocols, dispatching to the catalog emulator (component C)
//! or the backend adapter (component D) as each query is resolved.
//!
//! `Session` owns no socket. It is driven by two entry points —
//! `drive_startup` for the one untyped frame at the start of a
//! connection, `drive_message` for every typed frame after — and hands
//! back the bytes to write plus whether the connection should close.
//! `crate::server` owns the actual `TcpStream` and the read/write loop.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::backend::{value_to_cell, Backend, StoreType, EXEC_RESULT_FORMAT};
use crate::catalog;
use crate::error::ProxyError;
use crate::protocol::backend_message::{BackendMessage, ErrorFields, TxStatus};
use crate::protocol::message::{parse_message, parse_startup, DescribeKind, FrontendMessage};
use crate::protocol::types::{FieldDescription, Format, Row, MD5_SALT};

/// Where the session is in the handshake/query-cycle sequence (§4.B).
/// `ParamStatusEmit` has no state of its own — it is a burst emitted
/// synchronously the moment the password is accepted, folded into the
/// `AwaitPassword` → `AwaitQuery` transition below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitStartup,
    AwaitPassword,
    AwaitQuery,
    Closed,
}

/// A resolved query: the descriptor and rows cached from Parse (or a bare
/// Simple Query), ready to serialise straight into `RowDescription` /
/// `DataRow` messages.
#[derive(Debug, Clone)]
struct QueryResult {
    fields: Vec<FieldDescription>,
    rows: Vec<Row>,
}

/// A bound portal: a resolved query plus how far `Execute` has delivered
/// into it, so a `maxRows`-limited fetch can resume on a later `Execute`
/// without re-running Parse/Bind (§4.B step 4, §8 boundary behaviour).
#[derive(Debug, Clone)]
struct Portal {
    result: QueryResult,
    cursor: usize,
}

/// The result of driving the session with one input frame.
#[derive(Debug, Default)]
pub struct DriveOutcome {
    pub out: BytesMut,
    pub close: bool,
}

impl DriveOutcome {
    fn push(&mut self, msg: &BackendMessage) {
        msg.write(&mut self.out);
    }
}

/// Per-connection session state (component B). Created on accept,
/// destroyed on close or fatal protocol violation (§3 Session state).
pub struct Session {
    state: SessionState,
    backend: Arc<dyn Backend>,
    user: String,
    stmts: HashMap<String, QueryResult>,
    portals: HashMap<String, Portal>,
    /// Set once an Extended Query cycle has raised an error; cleared on
    /// `Sync`. While set, Bind/Describe/Execute are silently discarded
    /// (§4.B Error semantics).
    cycle_errored: bool,
}

impl Session {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Session {
            state: SessionState::AwaitStartup,
            backend,
            user: "postgres".to_string(),
            stmts: HashMap::new(),
            portals: HashMap::new(),
            cycle_errored: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the one untyped frame a connection ever starts with:
    /// `Startup`, `SSLRequest`, or `CancelRequest` (§4.B AwaitStartup).
    /// Called again for each subsequent frame for as long as the session
    /// stays in `AwaitStartup` — an SSL decline is followed by a second,
    /// still-untyped Startup frame, and a desynced `AwaitPassword` resets
    /// back here per the guard below.
    pub fn drive_startup(&mut self, payload: &[u8]) -> DriveOutcome {
        let mut out = DriveOutcome::default();
        match parse_startup(payload) {
            Ok(FrontendMessage::SslRequest) => {
                debug!("declining SSL request");
                out.out.extend_from_slice(b"N");
            }
            Ok(FrontendMessage::CancelRequest { .. }) => {
                debug!("cancel request received, closing with no response");
                out.close = true;
            }
            Ok(FrontendMessage::Startup { params, .. }) => {
                if let Some((_, user)) = params.iter().find(|(k, _)| k == "user") {
                    self.user = user.clone();
                }
                debug!(user = %self.user, "startup accepted, requesting MD5 password");
                out.push(&BackendMessage::AuthenticationMd5Password { salt: MD5_SALT });
                self.state = SessionState::AwaitPassword;
            }
            Ok(_) => unreachable!("parse_startup only returns startup-phase variants"),
            Err(e) => {
                warn!(error = %e, "protocol violation in startup frame");
                out.push(&BackendMessage::ErrorResponse(ErrorFields::new(
                    "08P01",
                    e.to_string(),
                )));
                out.close = true;
            }
        }
        out
    }

    /// Drive one typed message-phase frame.
    pub async fn drive_message(&mut self, type_byte: u8, payload: &[u8]) -> DriveOutcome {
        let mut out = DriveOutcome::default();
        let msg = match parse_message(type_byte, payload) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "protocol violation decoding message");
                out.push(&BackendMessage::ErrorResponse(ErrorFields::new(
                    "08P01",
                    e.to_string(),
                )));
                out.close = true;
                return out;
            }
        };

        match self.state {
            SessionState::AwaitPassword => self.drive_await_password(msg, &mut out),
            SessionState::AwaitQuery => self.drive_await_query(msg, &mut out).await,
            SessionState::AwaitStartup | SessionState::Closed => {
                out.close = true;
            }
        }
        out
    }

    fn drive_await_password(&mut self, msg: FrontendMessage, out: &mut DriveOutcome) {
        match msg {
            FrontendMessage::Password { .. } => {
                // Non-goal: accepted unvalidated (§1, §9 open question (b)).
                self.emit_param_status_burst(out);
                self.state = SessionState::AwaitQuery;
            }
            _ => {
                debug!("non-password message while awaiting password, resetting to AwaitStartup");
                self.state = SessionState::AwaitStartup;
            }
        }
    }

    /// ParamStatusEmit (§4.B): `AuthenticationOk`, the fixed
    /// `ParameterStatus` set, then `ReadyForQuery`.
    fn emit_param_status_burst(&self, out: &mut DriveOutcome) {
        out.push(&BackendMessage::AuthenticationOk);
        for (name, value) in self.param_status_defaults() {
            out.push(&BackendMessage::ParameterStatus {
                name: name.to_string(),
                value,
            });
        }
        out.push(&BackendMessage::ReadyForQuery {
            status: TxStatus::Idle,
        });
    }

    fn param_status_defaults(&self) -> [(&'static str, String); 9] {
        [
            ("client_encoding", "UTF8".to_string()),
            ("DateStyle", "ISO, MDY".to_string()),
            ("integer_datetimes", "on".to_string()),
            ("IntervalStyle", "postgres".to_string()),
            ("is_superuser", "on".to_string()),
            ("server_encoding", "UTF8".to_string()),
            ("server_version", "12.7".to_string()),
            ("session_authorization", self.user.clone()),
            ("standard_conforming_strings", "on".to_string()),
        ]
    }

    async fn drive_await_query(&mut self, msg: FrontendMessage, out: &mut DriveOutcome) {
        match msg {
            FrontendMessage::Query { sql } => self.simple_query(&sql, out).await,
            FrontendMessage::Parse {
                stmt_name, sql, ..
            } => self.on_parse(stmt_name, sql, out).await,
            FrontendMessage::Bind { portal, stmt, .. } => self.on_bind(portal, stmt, out),
            FrontendMessage::Describe { kind, name } => self.on_describe(kind, name, out),
            FrontendMessage::Execute { portal, max_rows } => {
                self.on_execute(portal, max_rows, out)
            }
            FrontendMessage::Sync => self.on_sync(out),
            FrontendMessage::Terminate => {
                debug!("terminate received, closing");
                out.close = true;
            }
            FrontendMessage::Startup { .. }
            | FrontendMessage::SslRequest
            | FrontendMessage::CancelRequest { .. }
            | FrontendMessage::Password { .. } => {
                warn!("handshake message received outside the handshake");
                out.push(&BackendMessage::ErrorResponse(ErrorFields::new(
                    "08P01",
                    "unexpected message outside handshake",
                )));
                out.push(&BackendMessage::ReadyForQuery {
                    status: TxStatus::Idle,
                });
            }
        }
    }

    /// SimpleQuery (§4.B): `DISCARD ALL` special-cased, everything else
    /// routed through the shared catalog/backend resolver and emitted as
    /// one `RowDescription` + N `DataRow` + `CommandComplete` +
    /// `ReadyForQuery` burst.
    async fn simple_query(&mut self, sql: &str, out: &mut DriveOutcome) {
        let sql = sql.trim_end_matches('\0');
        if sql.trim().eq_ignore_ascii_case("DISCARD ALL") {
            out.push(&BackendMessage::ParameterStatus {
                name: "is_superuser".to_string(),
                value: "on".to_string(),
            });
            out.push(&BackendMessage::ParameterStatus {
                name: "session_authorization".to_string(),
                value: self.user.clone(),
            });
            out.push(&BackendMessage::CommandComplete {
                tag: "DISCARD ALL".to_string(),
            });
            out.push(&BackendMessage::ReadyForQuery {
                status: TxStatus::Idle,
            });
            return;
        }

        match self.resolve_query(sql).await {
            Ok(result) => {
                let n = result.rows.len();
                out.push(&BackendMessage::RowDescription(result.fields));
                for row in result.rows {
                    out.push(&BackendMessage::DataRow(row));
                }
                out.push(&BackendMessage::CommandComplete {
                    tag: format!("SELECT {n}"),
                });
            }
            Err(e) => {
                warn!(error = %e, sql, "simple query failed");
                out.push(&BackendMessage::ErrorResponse(ErrorFields::new(
                    e.sqlstate(),
                    e.to_string(),
                )));
            }
        }
        out.push(&BackendMessage::ReadyForQuery {
            status: TxStatus::Idle,
        });
    }

    /// ExtendedQuery step 1 (§4.B): resolve the SQL now and cache the
    /// result under the statement name. Statements outlive the Sync that
    /// ends this cycle — only the portal is cleared at step 5 — so a
    /// client that prepares once and binds/executes across several
    /// separate Sync bursts (as `tokio_postgres::Client::prepare` then
    /// `query` does) still finds its statement.
    async fn on_parse(&mut self, stmt_name: String, sql: String, out: &mut DriveOutcome) {
        if self.cycle_errored {
            return;
        }
        let substituted = substitute_placeholders(&sql);
        match self.resolve_query(&substituted).await {
            Ok(result) => {
                self.stmts.insert(stmt_name, result);
                out.push(&BackendMessage::ParseComplete);
            }
            Err(e) => {
                warn!(error = %e, sql = %substituted, "extended query parse failed");
                out.push(&BackendMessage::ErrorResponse(ErrorFields::new(
                    e.sqlstate(),
                    e.to_string(),
                )));
                self.cycle_errored = true;
            }
        }
    }

    /// ExtendedQuery step 2: parameter-less for this workload (§4.B) — no
    /// real binding happens, so `Bind` just installs a fresh portal
    /// cursor over the statement's already-resolved result.
    fn on_bind(&mut self, portal: String, stmt: String, out: &mut DriveOutcome) {
        if self.cycle_errored {
            return;
        }
        match self.stmts.get(&stmt) {
            Some(result) => {
                self.portals.insert(
                    portal,
                    Portal {
                        result: result.clone(),
                        cursor: 0,
                    },
                );
                out.push(&BackendMessage::BindComplete);
            }
            None => {
                warn!(stmt, "bind references an unknown statement");
                out.push(&BackendMessage::ErrorResponse(ErrorFields::new(
                    "08P01",
                    format!("statement \"{stmt}\" does not exist"),
                )));
                self.cycle_errored = true;
            }
        }
    }

    /// ExtendedQuery step 3: `RowDescription` for either the statement or
    /// the portal. A statement-level Describe always reports text format
    /// (§4.B step 3 "with format code 0 per spec") since result formats
    /// are only settled once a portal is bound.
    fn on_describe(&mut self, kind: DescribeKind, name: String, out: &mut DriveOutcome) {
        if self.cycle_errored {
            return;
        }
        let fields = match kind {
            DescribeKind::Statement => self
                .stmts
                .get(&name)
                .map(|r| force_text_format(&r.fields)),
            DescribeKind::Portal => self.portals.get(&name).map(|p| p.result.fields.clone()),
        };
        match fields {
            Some(fields) => out.push(&BackendMessage::RowDescription(fields)),
            None => {
                warn!(name, ?kind, "describe references an unknown target");
                out.push(&BackendMessage::ErrorResponse(ErrorFields::new(
                    "08P01",
                    "describe target does not exist",
                )));
                self.cycle_errored = true;
            }
        }
    }

    /// ExtendedQuery step 4: deliver rows from the bound portal, honouring
    /// `maxRows` (§4.B step 4, §8 boundary behaviour). `maxRows<=0` means
    /// "return everything".
    fn on_execute(&mut self, portal: String, max_rows: i32, out: &mut DriveOutcome) {
        if self.cycle_errored {
            return;
        }
        let Some(slot) = self.portals.get_mut(&portal) else {
            warn!(portal, "execute references an unknown portal");
            out.push(&BackendMessage::ErrorResponse(ErrorFields::new(
                "08P01",
                format!("portal \"{portal}\" does not exist"),
            )));
            self.cycle_errored = true;
            return;
        };

        let total = slot.result.rows.len();
        let remaining = total - slot.cursor;
        let take = if max_rows <= 0 {
            remaining
        } else {
            (max_rows as usize).min(remaining)
        };
        for row in &slot.result.rows[slot.cursor..slot.cursor + take] {
            out.push(&BackendMessage::DataRow(row.clone()));
        }
        slot.cursor += take;

        let suspended = max_rows > 0 && (max_rows as usize) < remaining;
        if suspended {
            out.push(&BackendMessage::PortalSuspended);
        } else {
            out.push(&BackendMessage::CommandComplete {
                tag: format!("SELECT {total}"),
            });
        }
    }

    /// ExtendedQuery step 5: `ReadyForQuery` terminates the cycle; the
    /// portal/statement caches and the error flag reset for the next one.
    fn on_sync(&mut self, out: &mut DriveOutcome) {
        out.push(&BackendMessage::ReadyForQuery {
            status: TxStatus::Idle,
        });
        self.stmts.clear();
        self.portals.clear();
        self.cycle_errored = false;
    }

    /// Route one piece of SQL to the catalog emulator if it matches a
    /// known fingerprint (§4.C), falling back to the backend adapter
    /// (§4.D) otherwise — demoting a failed catalog match to "not
    /// catalog" never happens here because `catalog::resolve` only
    /// returns `Ok(None)` for unrecognised fingerprints, not for errors
    /// within a recognised one (§7 error taxonomy #3).
    async fn resolve_query(&self, sql: &str) -> Result<QueryResult, ProxyError> {
        if let Some(result) = catalog::resolve(sql, self.backend.as_ref()).await? {
            return Ok(QueryResult {
                fields: result.fields,
                rows: result.rows,
            });
        }
        self.run_against_backend(sql).await
    }

    async fn run_against_backend(&self, sql: &str) -> Result<QueryResult, ProxyError> {
        let exec = self
            .backend
            .execute(sql)
            .await
            .map_err(ProxyError::Backend)?;
        let mut fields = Vec::with_capacity(exec.columns.len());
        for (index, col) in exec.columns.iter().enumerate() {
            let (type_oid, type_len) = StoreType::classify(&col.type_tag)?.oid_and_len();
            fields.push(FieldDescription::new(
                col.name.clone(),
                (index + 1) as i16,
                type_oid,
                type_len,
                EXEC_RESULT_FORMAT,
            ));
        }
        let rows = exec
            .rows
            .iter()
            .map(|row| row.iter().map(value_to_cell).collect())
            .collect();
        Ok(QueryResult { fields, rows })
    }
}

fn force_text_format(fields: &[FieldDescription]) -> Vec<FieldDescription> {
    fields
        .iter()
        .cloned()
        .map(|mut f| {
            f.format = Format::Text;
            f
        })
        .collect()
}

/// Strips client-injected placeholder tokens of the shape `$Identifier`
/// (e.g. `$Table`) from SQL text before it is forwarded to the backend
/// (§4.B variable substitution, §9 open question (c)). The BI tool's
/// exploratory queries carry these; the analytic store's SQL dialect has
/// no notion of them. Restricted to an alphabetic lead character so it
/// never touches numbered bind parameters (`$1`) or dollar-quoted string
/// bodies (`$$...$$`), which are a different shape entirely.
fn substitute_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '$' && sql[i + 1..].starts_with(|ch: char| ch.is_ascii_alphabetic()) {
            let rest = &sql[i + 1..];
            let end = rest
                .find(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
                .unwrap_or(rest.len());
            let skip_to = i + 1 + end;
            while let Some((j, _)) = chars.clone().next() {
                if j >= skip_to {
                    break;
                }
                chars.next();
            }
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryBackend, MemoryTable};
    use crate::backend::{Column, ExecResult, Value};
    use crate::catalog::types as catalog_types;
    use crate::protocol::backend_message::BackendMessage as BM;
    use crate::protocol::frame::FrameReader;
    use crate::protocol::message::{DescribeKind as DK, STARTUP_CODE};
    use crate::protocol::types::Cell;

    fn startup_payload(user: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&STARTUP_CODE.to_be_bytes());
        body.extend_from_slice(format!("user\0{user}\0database\0postgres\0\0").as_bytes());
        body
    }

    fn drain(out: BytesMut) -> Vec<BackendMessage> {
        let mut reader = FrameReader::new();
        reader.feed(&out);
        let mut msgs = Vec::new();
        while let Some((t, payload)) = reader.try_take_message().unwrap() {
            msgs.push(crate::protocol::backend_message::parse(t, &payload).unwrap());
        }
        msgs
    }

    #[tokio::test]
    async fn full_handshake_then_idle() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = Session::new(backend);

        let out = session.drive_startup(&startup_payload("postgres"));
        assert_eq!(session.state(), SessionState::AwaitPassword);
        let msgs = drain(out.out);
        assert_eq!(
            msgs,
            vec![BM::AuthenticationMd5Password { salt: MD5_SALT }]
        );

        let out = session.drive_message(b'p', b"md5whatever\0").await;
        assert_eq!(session.state(), SessionState::AwaitQuery);
        let msgs = drain(out.out);
        assert_eq!(msgs[0], BM::AuthenticationOk);
        assert!(msgs.contains(&BM::ParameterStatus {
            name: "session_authorization".to_string(),
            value: "postgres".to_string(),
        }));
        assert_eq!(
            msgs.last().unwrap(),
            &BM::ReadyForQuery {
                status: TxStatus::Idle
            }
        );
    }

    #[tokio::test]
    async fn ssl_request_is_declined_with_single_byte() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = Session::new(backend);
        let payload = 80877103i32.to_be_bytes();
        let out = session.drive_startup(&payload);
        assert_eq!(session.state(), SessionState::AwaitStartup);
        assert_eq!(&out.out[..], b"N");
        assert!(!out.close);
    }

    #[tokio::test]
    async fn cancel_request_closes_with_no_response() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = Session::new(backend);
        let mut payload = Vec::new();
        payload.extend_from_slice(&80877102i32.to_be_bytes());
        payload.extend_from_slice(&1i32.to_be_bytes());
        payload.extend_from_slice(&2i32.to_be_bytes());
        let out = session.drive_startup(&payload);
        assert!(out.close);
        assert!(out.out.is_empty());
    }

    #[tokio::test]
    async fn unrecognised_startup_code_is_fatal() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = Session::new(backend);
        let out = session.drive_startup(&99i32.to_be_bytes());
        assert!(out.close);
        let msgs = drain(out.out);
        match &msgs[0] {
            BM::ErrorResponse(fields) => assert_eq!(fields.sqlstate, "08P01"),
            other => panic!("expected ErrorResponse, got {other:?}"),
        }
    }

    async fn authed_session(backend: Arc<dyn Backend>) -> Session {
        let mut session = Session::new(backend);
        session.drive_startup(&startup_payload("postgres"));
        session.drive_message(b'p', b"x\0").await;
        assert_eq!(session.state(), SessionState::AwaitQuery);
        session
    }

    #[tokio::test]
    async fn simple_query_against_backend() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .stub_query(
                "select * from test1;",
                ExecResult {
                    columns: vec![Column {
                        name: "xint".to_string(),
                        type_tag: "int".to_string(),
                        length: 4,
                    }],
                    rows: vec![
                        vec![Value::Int(5)],
                        vec![Value::Int(4)],
                        vec![Value::Int(3)],
                        vec![Value::Int(2)],
                        vec![Value::Int(1)],
                    ],
                },
            )
            .await;
        let mut session = authed_session(backend).await;

        let mut sql = b"select * from test1;".to_vec();
        sql.push(0);
        let msg = crate::protocol::message::parse_message(b'Q', &sql).unwrap();
        let FrontendMessage::Query { sql } = msg else {
            panic!()
        };
        let mut out = DriveOutcome::default();
        session.simple_query(&sql, &mut out).await;
        let msgs = drain(out.out);

        match &msgs[0] {
            BM::RowDescription(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].name, "xint");
                assert_eq!(fields[0].type_oid, 23);
                assert_eq!(fields[0].type_len, 4);
                assert_eq!(fields[0].format, Format::Text);
            }
            other => panic!("expected RowDescription, got {other:?}"),
        }
        let data_rows: Vec<_> = msgs
            .iter()
            .filter(|m| matches!(m, BM::DataRow(_)))
            .collect();
        assert_eq!(data_rows.len(), 5);
        assert_eq!(
            msgs[msgs.len() - 2],
            BM::CommandComplete {
                tag: "SELECT 5".to_string()
            }
        );
        assert_eq!(
            *msgs.last().unwrap(),
            BM::ReadyForQuery {
                status: TxStatus::Idle
            }
        );
    }

    #[tokio::test]
    async fn discard_all_special_case() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = authed_session(backend).await;
        let mut out = DriveOutcome::default();
        session.simple_query("DISCARD ALL", &mut out).await;
        let msgs = drain(out.out);
        assert_eq!(
            msgs,
            vec![
                BM::ParameterStatus {
                    name: "is_superuser".to_string(),
                    value: "on".to_string(),
                },
                BM::ParameterStatus {
                    name: "session_authorization".to_string(),
                    value: "postgres".to_string(),
                },
                BM::CommandComplete {
                    tag: "DISCARD ALL".to_string()
                },
                BM::ReadyForQuery {
                    status: TxStatus::Idle
                },
            ]
        );
    }

    #[tokio::test]
    async fn extended_query_character_set_probe() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = authed_session(backend).await;

        let mut out = DriveOutcome::default();
        session
            .on_parse(
                String::new(),
                catalog_types::CHAR_SET_QUERY.to_string(),
                &mut out,
            )
            .await;
        session.on_bind(String::new(), String::new(), &mut out);
        session.on_describe(DK::Portal, String::new(), &mut out);
        session.on_execute(String::new(), 0, &mut out);
        session.on_sync(&mut out);

        let msgs = drain(out.out);
        assert_eq!(msgs[0], BM::ParseComplete);
        assert_eq!(msgs[1], BM::BindComplete);
        match &msgs[2] {
            BM::RowDescription(fields) => assert_eq!(fields.len(), 1),
            other => panic!("expected RowDescription, got {other:?}"),
        }
        assert_eq!(msgs[3], BM::DataRow(vec![Cell::text("UTF8")]));
        assert_eq!(
            msgs[4],
            BM::CommandComplete {
                tag: "SELECT 1".to_string()
            }
        );
        assert_eq!(
            msgs[5],
            BM::ReadyForQuery {
                status: TxStatus::Idle
            }
        );
    }

    #[tokio::test]
    async fn extended_query_table_list_probe() {
        let backend = Arc::new(
            MemoryBackend::new().with_table(
                "t",
                MemoryTable {
                    columns: vec![],
                    rows: vec![],
                },
            ),
        );
        let mut session = authed_session(backend).await;
        let mut out = DriveOutcome::default();
        session
            .on_parse(
                String::new(),
                catalog_types::USER_TABLE_LIST_QUERY.to_string(),
                &mut out,
            )
            .await;
        session.on_bind(String::new(), String::new(), &mut out);
        session.on_describe(DK::Portal, String::new(), &mut out);
        session.on_execute(String::new(), 0, &mut out);
        session.on_sync(&mut out);
        let msgs = drain(out.out);
        assert_eq!(
            msgs[3],
            BM::DataRow(vec![
                Cell::text("public"),
                Cell::text("t"),
                Cell::text("BASE TABLE"),
            ])
        );
    }

    #[tokio::test]
    async fn describe_statement_forces_text_format() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = authed_session(backend).await;
        let mut out = DriveOutcome::default();
        session
            .on_parse(
                "s1".to_string(),
                catalog_types::CHAR_SET_QUERY.to_string(),
                &mut out,
            )
            .await;
        session.on_describe(DK::Statement, "s1".to_string(), &mut out);
        let msgs = drain(out.out);
        match &msgs[1] {
            BM::RowDescription(fields) => assert_eq!(fields[0].format, Format::Text),
            other => panic!("expected RowDescription, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_with_max_rows_suspends_portal() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .stub_query(
                "select * from big",
                ExecResult {
                    columns: vec![Column {
                        name: "n".to_string(),
                        type_tag: "int".to_string(),
                        length: 4,
                    }],
                    rows: (1..=5).map(|n| vec![Value::Int(n)]).collect(),
                },
            )
            .await;
        let mut session = authed_session(backend).await;
        let mut out = DriveOutcome::default();
        session
            .on_parse(String::new(), "select * from big".to_string(), &mut out)
            .await;
        session.on_bind(String::new(), String::new(), &mut out);
        session.on_execute(String::new(), 2, &mut out);
        let msgs = drain(std::mem::take(&mut out.out));
        let data_rows: Vec<_> = msgs.iter().filter(|m| matches!(m, BM::DataRow(_))).collect();
        assert_eq!(data_rows.len(), 2);
        assert_eq!(*msgs.last().unwrap(), BM::PortalSuspended);

        // A later Execute on the same portal resumes from the cursor.
        let mut out2 = DriveOutcome::default();
        session.on_execute(String::new(), 0, &mut out2);
        let msgs2 = drain(out2.out);
        let data_rows2: Vec<_> = msgs2.iter().filter(|m| matches!(m, BM::DataRow(_))).collect();
        assert_eq!(data_rows2.len(), 3);
        assert_eq!(
            *msgs2.last().unwrap(),
            BM::CommandComplete {
                tag: "SELECT 5".to_string()
            }
        );
    }

    #[tokio::test]
    async fn bind_before_parse_is_desync() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = authed_session(backend).await;
        let mut out = DriveOutcome::default();
        session.on_bind("p".to_string(), "missing".to_string(), &mut out);
        let msgs = drain(out.out);
        match &msgs[0] {
            BM::ErrorResponse(fields) => assert_eq!(fields.sqlstate, "08P01"),
            other => panic!("expected ErrorResponse, got {other:?}"),
        }

        // Subsequent Describe/Execute in the same cycle are discarded.
        let mut out2 = DriveOutcome::default();
        session.on_describe(DK::Portal, "p".to_string(), &mut out2);
        session.on_execute("p".to_string(), 0, &mut out2);
        assert!(out2.out.is_empty());

        session.on_sync(&mut out2);
        assert_eq!(
            drain(out2.out),
            vec![BM::ReadyForQuery {
                status: TxStatus::Idle
            }]
        );
    }

    #[tokio::test]
    async fn backend_failure_is_surfaced_as_58000() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = authed_session(backend).await;
        let mut out = DriveOutcome::default();
        session.simple_query("select * from nope", &mut out).await;
        let msgs = drain(out.out);
        match &msgs[0] {
            BM::ErrorResponse(fields) => assert_eq!(fields.sqlstate, "58000"),
            other => panic!("expected ErrorResponse, got {other:?}"),
        }
        assert_eq!(
            msgs[1],
            BM::ReadyForQuery {
                status: TxStatus::Idle
            }
        );
    }

    #[tokio::test]
    async fn unsupported_store_type_is_0a000() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .stub_query(
                "select blob from weird",
                ExecResult {
                    columns: vec![Column {
                        name: "blob".to_string(),
                        type_tag: "binary".to_string(),
                        length: -1,
                    }],
                    rows: vec![],
                },
            )
            .await;
        let mut session = authed_session(backend).await;
        let mut out = DriveOutcome::default();
        session
            .simple_query("select blob from weird", &mut out)
            .await;
        let msgs = drain(out.out);
        match &msgs[0] {
            BM::ErrorResponse(fields) => assert_eq!(fields.sqlstate, "0A000"),
            other => panic!("expected ErrorResponse, got {other:?}"),
        }
    }

    #[test]
    fn substitution_strips_dollar_table_tokens_only() {
        assert_eq!(
            substitute_placeholders("select * from $Table where x=1"),
            "select * from  where x=1"
        );
        assert_eq!(substitute_placeholders("select $1"), "select $1");
        assert_eq!(substitute_placeholders("select $$literal$$"), "select $$literal$$");
    }
}

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

//! A PostgreSQL wire-protocol front-end: speaks Postgres v3 to ordinary
//! client tools and BI reporting tools, and translates sessions into
//! queries against a columnar analytic store that speaks its own native
//! protocol.
//!
//! - [`protocol`] — the wire framer: byte-stream tokenisation, typed
//!   message parsing, and typed message serialisation.
//! - [`session`] — the per-connection state machine: startup/auth
//!   handshake, Simple Query, and Extended Query sub-protocols.
//! - [`catalog`] — recognises the BI tool's `pg_catalog` /
//!   `information_schema` introspection queries and answers them
//!   synthetically.
//! - [`backend`] — the thin contract over the analytic store's
//!   connection.
//! - [`server`] — the TCP accept loop and per-connection read/write
//!   driver around [`session::Session`].

pub mod backend;
pub mod catalog;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;

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

//! The TCP accept loop and per-connection read/write driver. Owns the
//! socket; `crate::session::Session` owns everything about protocol
//! state.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::backend::Backend;
use crate::protocol::frame::FrameReader;
use crate::session::{Session, SessionState};

/// Bind `addr` and accept connections until `ctrl_c` fires, spawning one
/// task per connection against a shared `backend`.
pub async fn serve(addr: SocketAddr, backend: Arc<dyn Backend>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    serve_on(listener, backend).await
}

/// Accept connections on an already-bound listener until `ctrl_c` fires.
/// Split out from [`serve`] so tests can bind an ephemeral port (`:0`)
/// and learn the real address before handing the listener off here.
pub async fn serve_on(listener: TcpListener, backend: Arc<dyn Backend>) -> std::io::Result<()> {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, peer)) => {
                        let backend = backend.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(socket, backend).await {
                                warn!(%peer, error = %e, "connection ended with an error");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "accept failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }
    Ok(())
}

/// Drive one connection end to end: the untyped startup frame(s), then
/// typed message-phase frames, until the peer closes or the session
/// terminates itself.
///
/// The startup phase is re-entered (`reading_startup_frames = true`)
/// whenever the session FSM reports `AwaitStartup` — not just for the
/// very first frame — because `Session::drive_await_password` can send
/// the connection back to `AwaitStartup` on a desynced password
/// exchange (§4.B), and the next frame on the wire is once again an
/// untyped one.
async fn handle_connection(mut socket: TcpStream, backend: Arc<dyn Backend>) -> std::io::Result<()> {
    let mut reader = FrameReader::new();
    let mut session = Session::new(backend);
    let mut read_buf = [0u8; 8192];
    let mut reading_startup_frames = true;

    loop {
        let n = socket.read(&mut read_buf).await?;
        if n == 0 {
            debug!("peer closed connection");
            return Ok(());
        }
        reader.feed(&read_buf[..n]);

        let mut out = bytes::BytesMut::new();
        let mut close = false;

        loop {
            if reading_startup_frames {
                match reader.try_take_startup() {
                    Ok(Some(payload)) => {
                        let outcome = session.drive_startup(&payload);
                        out.extend_from_slice(&outcome.out);
                        close = outcome.close;
                        reading_startup_frames = session.state() == SessionState::AwaitStartup;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "malformed startup frame");
                        return Ok(());
                    }
                }
            } else {
                match reader.try_take_message() {
                    Ok(Some((type_byte, payload))) => {
                        let outcome = session.drive_message(type_byte, &payload).await;
                        out.extend_from_slice(&outcome.out);
                        close = outcome.close;
                        reading_startup_frames = session.state() == SessionState::AwaitStartup;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "malformed message frame");
                        return Ok(());
                    }
                }
            }
            if close {
                break;
            }
        }

        if !out.is_empty() {
            socket.write_all(&out).await?;
        }
        if close {
            return Ok(());
        }
    }
}

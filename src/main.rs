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

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use pgshim::backend::net::NetBackend;
use pgshim::backend::BackendConfig;
use tracing_subscriber::EnvFilter;

/// PostgreSQL wire-protocol front-end for a columnar analytic store.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on for Postgres client connections.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on for Postgres client connections.
    #[arg(long, default_value_t = 5433)]
    port: u16,

    /// Analytic store host to connect to.
    #[arg(long, default_value = "127.0.0.1")]
    backend_host: String,

    /// Analytic store port to connect to.
    #[arg(long, default_value_t = 5000)]
    backend_port: u16,

    /// Database name to request from the analytic store.
    #[arg(long, default_value = "master")]
    backend_db: String,

    /// User name to authenticate to the analytic store with.
    #[arg(long, default_value = "sqream")]
    backend_user: String,

    /// Password to authenticate to the analytic store with.
    #[arg(long, default_value = "")]
    backend_password: String,

    /// Connect to the analytic store's clustered front end instead of a
    /// single worker.
    #[arg(long)]
    clustered: bool,

    /// Increase log verbosity (info -> debug -> trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "pgshim=info",
        1 => "pgshim=debug",
        _ => "pgshim=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .init();

    let backend_config = BackendConfig {
        host: args.backend_host,
        port: args.backend_port,
        database: args.backend_db,
        user: args.backend_user,
        password: args.backend_password,
        clustered: args.clustered,
    };

    let backend = match NetBackend::connect(&backend_config).await {
        Ok(b) => Arc::new(b),
        Err(e) => {
            eprintln!("failed to connect to backend: {e}");
            return ExitCode::FAILURE;
        }
    };

    let addr: SocketAddr = match format!("{}:{}", args.host, args.port).parse() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("invalid listen address: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = pgshim::server::serve(addr, backend).await {
        eprintln!("server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

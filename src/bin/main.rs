// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use ledger_transfer_rs::{AccountStore, Ledger, LedgerConfig, LogNotifier, QueuedNotifier, api};
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Ledger Transfer Server - In-memory accounts with atomic transfers
///
/// Serves the account API over HTTP. Every flag can also be set through its
/// environment variable.
#[derive(Parser, Debug)]
#[command(name = "ledger-transfer-rs")]
#[command(about = "An in-memory account ledger serving atomic transfers over HTTP", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "LEDGER_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Maximum wait for each account lock, in milliseconds
    #[arg(long, env = "LEDGER_LOCK_TIMEOUT_MS", default_value_t = LedgerConfig::DEFAULT_LOCK_TIMEOUT_MS)]
    lock_timeout_ms: u64,

    /// Notices that may wait for delivery before new ones are dropped
    #[arg(long, env = "LEDGER_NOTICE_QUEUE", default_value_t = QueuedNotifier::DEFAULT_CAPACITY)]
    notice_queue: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "LEDGER_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(args).await {
        eprintln!("Error running server: {}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> std::io::Result<()> {
    let config = LedgerConfig::with_lock_timeout_ms(args.lock_timeout_ms);
    let notifier = QueuedNotifier::with_capacity(Arc::new(LogNotifier), args.notice_queue)?;

    // One store for the whole process, handed to the ledger explicitly.
    let store = Arc::new(AccountStore::new());
    let ledger = Arc::new(Ledger::new(store, Arc::new(notifier), config));

    let listener = TcpListener::bind(args.bind).await?;
    info!(
        addr = %listener.local_addr()?,
        lock_timeout_ms = args.lock_timeout_ms,
        "ledger API server listening"
    );

    axum::serve(listener, api::router(ledger))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

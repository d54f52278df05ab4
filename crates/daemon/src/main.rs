// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tellerd: the teller banking daemon
//!
//! Initializes the store (recovery, migration, admin seeding), binds the
//! TCP listener, and serves one session per connection until a signal
//! asks it to stop.

use std::io::Write as _;
use std::path::PathBuf;

use clap::Parser;
use teller_daemon::config::Config;
use teller_daemon::server;
use teller_store::Store;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Banking daemon: owns the record store and speaks the line protocol
#[derive(Debug, Parser)]
#[command(name = "tellerd", version, about)]
struct Args {
    /// Directory holding the table files, logs and journal
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Address to listen on (overrides teller.toml)
    #[arg(long)]
    listen: Option<String>,

    /// Port to listen on; 0 picks an ephemeral port (overrides teller.toml)
    #[arg(long)]
    port: Option<u16>,

    /// Log filter, e.g. "info" or "teller_store=debug" (overrides teller.toml)
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load(args.data_dir, args.listen, args.port, args.log)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Recovery, migration and admin seeding must finish before the
    // listener is bound
    let store = Store::open(&config.data_dir);
    {
        let store = store.clone();
        tokio::task::spawn_blocking(move || store.init()).await??;
    }
    info!(data_dir = %config.data_dir.display(), "store initialized");

    let listener = TcpListener::bind((config.listen_addr.as_str(), config.port)).await?;
    let local = listener.local_addr()?;
    info!(%local, "listening");

    // Startup marker for supervisors and tests; carries the bound port
    // because --port 0 picks an ephemeral one
    let mut stdout = std::io::stdout();
    writeln!(stdout, "READY {}", local.port())?;
    stdout.flush()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
        let _ = shutdown_tx.send(true);
    });

    server::serve(listener, store, shutdown_rx).await?;
    info!("daemon stopped");
    Ok(())
}

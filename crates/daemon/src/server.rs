// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accept loop with an explicit shutdown signal threaded in

use std::io;

use teller_core::Clock;
use teller_store::Store;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::session;

/// Accept connections until the shutdown signal flips
///
/// Each connection gets its own session task. Stopping the accept loop
/// does not interrupt running sessions; their in-flight store calls run
/// to completion on the blocking pool.
pub async fn serve<C: Clock + 'static>(
    listener: TcpListener,
    store: Store<C>,
    mut shutdown: watch::Receiver<bool>,
) -> io::Result<()> {
    loop {
        tokio::select! {
            result = listener.accept() => match result {
                Ok((stream, peer)) => {
                    info!(%peer, "client connected");
                    let store = store.clone();
                    tokio::spawn(async move {
                        match session::run(stream, store).await {
                            Ok(()) => info!(%peer, "client disconnected"),
                            Err(e) => warn!(%peer, error = %e, "session ended with error"),
                        }
                    });
                }
                Err(e) => error!(error = %e, "accept failed"),
            },
            _ = shutdown.changed() => {
                info!("shutdown requested, no longer accepting connections");
                return Ok(());
            }
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wardend`, the warden coordination daemon.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use warden_core::SystemClock;
use warden_server::{loopback, CoordFsm, Frontend, Listener, RaftBridge, ServerConfig};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::parse();
    init_tracing(config.verbose);

    let tcp = match TcpListener::bind(&config.listen).await {
        Ok(tcp) => tcp,
        Err(err) => {
            error!(addr = %config.listen, %err, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    if !config.peers.is_empty() || config.join {
        // Multi-node deployments wire an external raft transport to the
        // same channel triple; this binary only ships the single-node one.
        warn!("peer configuration present but running single-node raft");
    }

    let shutdown = CancellationToken::new();
    let (raft, _cluster_tx) = loopback(config.node_id, &config.listen);

    let bridge = RaftBridge::start(
        Arc::new(CoordFsm::new()),
        raft.propose,
        raft.committed,
        shutdown.clone(),
    );
    let frontend =
        Frontend::start(bridge, raft.cluster, Arc::new(SystemClock), shutdown.clone());

    info!(addr = %config.listen, node_id = config.node_id, "wardend starting");
    let listener = Listener::new(tcp, frontend, shutdown.clone());
    let serve = tokio::spawn(listener.run());

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to wait for shutdown signal");
    }
    info!("shutting down");
    shutdown.cancel();
    let _ = serve.await;

    ExitCode::SUCCESS
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec harness: boots an in-process server stack on an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use warden_client::Client;
use warden_core::SystemClock;
use warden_server::{loopback, ClusterState, CoordFsm, Frontend, Listener, RaftBridge};

/// How hard the specs push the KeepAlive loop.
pub const SPEC_KEEPALIVE_DELAY: Duration = Duration::from_millis(50);

pub struct TestServer {
    pub addr: String,
    pub cluster_tx: watch::Sender<ClusterState>,
    shutdown: CancellationToken,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Boot a full single-node stack: loopback raft, bridge, frontend,
/// listener. Returns once the listener is accepting.
pub async fn start_server(node_id: u64) -> TestServer {
    let tcp = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = tcp.local_addr().expect("local addr").to_string();

    let (raft, cluster_tx) = loopback(node_id, &addr);
    let shutdown = CancellationToken::new();
    let bridge = RaftBridge::start(
        Arc::new(CoordFsm::new()),
        raft.propose,
        raft.committed,
        shutdown.clone(),
    );
    let frontend =
        Frontend::start(bridge, raft.cluster, Arc::new(SystemClock), shutdown.clone());
    tokio::spawn(Listener::new(tcp, frontend, shutdown.clone()).run());

    TestServer { addr, cluster_tx, shutdown }
}

/// Connect a client to the given servers, in order.
pub async fn connect(servers: &[&TestServer]) -> Client {
    let addrs: Vec<String> = servers.iter().map(|server| server.addr.clone()).collect();
    Client::connect(&addrs, SPEC_KEEPALIVE_DELAY).await.expect("client connect")
}

/// Poll `check` until it passes or the spec deadline lapses.
pub async fn wait_for(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

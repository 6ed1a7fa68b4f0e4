// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raft collaborator surface.
//!
//! The consensus implementation lives outside this crate. It is consumed
//! through three channels: proposals in, committed entries out, and a
//! watch of cluster state (who leads, where). Any raft that speaks this
//! triple plugs in unchanged.

use tokio::sync::{mpsc, watch};

/// Leadership as the raft layer currently sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterState {
    pub is_leader: bool,
    /// 0 when no leader is known.
    pub leader_id: u64,
    /// Empty when no leader is known.
    pub leader_addr: String,
}

impl ClusterState {
    /// Nobody leads, as far as we know.
    pub fn unknown() -> Self {
        Self { is_leader: false, leader_id: 0, leader_addr: String::new() }
    }

    /// This node leads.
    pub fn leader(id: u64, addr: impl Into<String>) -> Self {
        Self { is_leader: true, leader_id: id, leader_addr: addr.into() }
    }

    /// Another node leads.
    pub fn follower(leader_id: u64, leader_addr: impl Into<String>) -> Self {
        Self { is_leader: false, leader_id, leader_addr: leader_addr.into() }
    }
}

/// The channel triple handed to the bridge.
pub struct RaftHandle {
    pub propose: mpsc::Sender<Vec<u8>>,
    pub committed: mpsc::Receiver<Vec<u8>>,
    pub cluster: watch::Receiver<ClusterState>,
}

/// Single-node raft: proposals commit immediately by flowing straight
/// into the committed channel. The returned watch sender lets the caller
/// (or a test) steer leadership.
pub fn loopback(node_id: u64, addr: &str) -> (RaftHandle, watch::Sender<ClusterState>) {
    let (propose, committed) = mpsc::channel(64);
    let (cluster_tx, cluster) = watch::channel(ClusterState::leader(node_id, addr));
    (RaftHandle { propose, committed, cluster }, cluster_tx)
}

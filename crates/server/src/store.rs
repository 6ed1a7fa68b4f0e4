// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node store: per-path content, generation, lock holder, finalization flag.
//!
//! Nodes are owned exclusively by the table; everyone else holds an `Arc`
//! and goes through the accessors. A node is created on first open with
//! empty content and generation 0 and is never removed.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use warden_core::{DescriptorKey, NodeContentAndStat, NodePath, NodeStat, SessionKey};

/// Which descriptor holds a node's exclusive lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockHolder {
    pub session: SessionKey,
    pub descriptor: DescriptorKey,
}

struct NodeState {
    content: Vec<u8>,
    generation: u64,
    last_modified_ms: u64,
    locker: Option<LockHolder>,
    /// False between a content commit and its invalidation fan-out.
    finalized: bool,
}

/// One node's replicated state.
pub struct NodeInfo {
    path: NodePath,
    state: RwLock<NodeState>,
}

impl NodeInfo {
    fn new(path: NodePath) -> Self {
        Self {
            path,
            state: RwLock::new(NodeState {
                content: Vec::new(),
                generation: 0,
                last_modified_ms: 0,
                locker: None,
                finalized: true,
            }),
        }
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn content_and_stat(&self) -> NodeContentAndStat {
        let state = self.state.read();
        NodeContentAndStat {
            content: state.content.clone(),
            stat: NodeStat {
                generation: state.generation,
                last_modified_ms: state.last_modified_ms,
            },
        }
    }

    pub fn stat(&self) -> NodeStat {
        let state = self.state.read();
        NodeStat { generation: state.generation, last_modified_ms: state.last_modified_ms }
    }

    /// Generation-gated write. Succeeds when `min_generation` is at least
    /// the current generation; on success the generation rises by exactly
    /// one and the node becomes unfinalized until its fan-out completes.
    pub fn set_content_if(
        &self,
        content: Vec<u8>,
        min_generation: u64,
        modified_ms: u64,
    ) -> bool {
        let mut state = self.state.write();
        if min_generation < state.generation {
            return false;
        }
        state.content = content;
        state.generation += 1;
        state.last_modified_ms = modified_ms;
        state.finalized = false;
        true
    }

    /// Mark the in-flight write's fan-out as delivered.
    pub fn finalize(&self) {
        self.state.write().finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.state.read().finalized
    }

    pub fn locker(&self) -> Option<LockHolder> {
        self.state.read().locker
    }

    pub fn set_locker(&self, holder: LockHolder) {
        self.state.write().locker = Some(holder);
    }

    /// Release the lock. Fails when `holder` is not the current locker.
    pub fn release(&self, holder: LockHolder) -> bool {
        let mut state = self.state.write();
        if state.locker != Some(holder) {
            return false;
        }
        state.locker = None;
        true
    }
}

/// Path-keyed table of nodes.
#[derive(Default)]
pub struct NodeTable {
    nodes: RwLock<HashMap<NodePath, Arc<NodeInfo>>>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &NodePath) -> Option<Arc<NodeInfo>> {
        self.nodes.read().get(path).cloned()
    }

    pub fn get_or_create(&self, path: &NodePath) -> Arc<NodeInfo> {
        if let Some(node) = self.get(path) {
            return node;
        }
        let mut nodes = self.nodes.write();
        nodes
            .entry(path.clone())
            .or_insert_with(|| Arc::new(NodeInfo::new(path.clone())))
            .clone()
    }

    /// Nodes with a committed write whose fan-out has not completed.
    /// Consulted at leadership takeover.
    pub fn unfinalized(&self) -> Vec<Arc<NodeInfo>> {
        self.nodes.read().values().filter(|node| !node.is_finalized()).cloned().collect()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

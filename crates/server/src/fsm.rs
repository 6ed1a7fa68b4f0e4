// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic state machine over the session registry and node store.
//!
//! `apply` is a pure function of the command stream: no clocks, no I/O,
//! no randomness. Every replica feeds it the committed log in commit
//! order and arrives at identical tables.

use std::sync::Arc;

use tracing::warn;

use warden_core::{
    DescriptorKey, NodeContentAndStat, NodeDescriptor, NodePath, NodeStat, SessionKey,
};

use crate::command::Command;
use crate::registry::{DescriptorMeta, SessionTable};
use crate::store::{LockHolder, NodeInfo, NodeTable};

/// Result of applying one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// OpenSession: the minted key.
    Session(SessionKey),
    /// OpenNode: the minted descriptor, or None when the session is gone.
    Node(Option<NodeDescriptor>),
    /// ReleaseLock: whether the holder matched.
    Released(bool),
    /// PrepareSet: whether the generation gate passed.
    Prepared(bool),
    /// Everything else.
    Done,
}

#[derive(Default)]
pub struct CoordFsm {
    sessions: SessionTable,
    nodes: NodeTable,
}

impl CoordFsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, command: &Command) -> Applied {
        match command {
            Command::OpenSession { .. } => Applied::Session(self.sessions.open_session()),

            Command::CloseSession { session, .. } => {
                match self.sessions.close_session(*session) {
                    Some(dropped) => {
                        for descriptor in &dropped {
                            self.release_if_held(descriptor);
                        }
                    }
                    None => warn!(%session, "close for unknown session"),
                }
                Applied::Done
            }

            Command::OpenNode { session, path, read_only, events, .. } => {
                if !self.sessions.contains(*session) {
                    warn!(%session, %path, "open on dead session");
                    return Applied::Node(None);
                }
                self.nodes.get_or_create(path);
                Applied::Node(self.sessions.open_descriptor(*session, path, *read_only, *events))
            }

            Command::CloseNode { descriptor, .. } => {
                if self.sessions.close_descriptor(descriptor) {
                    self.release_if_held(descriptor);
                } else {
                    warn!(%descriptor, "close for unknown descriptor");
                }
                Applied::Done
            }

            Command::SetLocked { descriptor, .. } => {
                match self.node_for(descriptor) {
                    Some(node) => node.set_locker(LockHolder {
                        session: descriptor.session,
                        descriptor: descriptor.descriptor,
                    }),
                    None => warn!(%descriptor, "lock set with invalid descriptor"),
                }
                Applied::Done
            }

            Command::ReleaseLock { descriptor, .. } => {
                let released = match self.node_for(descriptor) {
                    Some(node) => node.release(LockHolder {
                        session: descriptor.session,
                        descriptor: descriptor.descriptor,
                    }),
                    None => false,
                };
                Applied::Released(released)
            }

            Command::PrepareSet { descriptor, content, min_generation, modified_ms, .. } => {
                let prepared = match self.node_for(descriptor) {
                    Some(node) => {
                        node.set_content_if(content.clone(), *min_generation, *modified_ms)
                    }
                    None => false,
                };
                Applied::Prepared(prepared)
            }

            Command::FinalizeSet { path, .. } => {
                match self.nodes.get(path) {
                    Some(node) => node.finalize(),
                    None => warn!(%path, "finalize for unknown node"),
                }
                Applied::Done
            }
        }
    }

    /// Drop the lock a vanished descriptor was holding, if any.
    fn release_if_held(&self, descriptor: &NodeDescriptor) {
        if let Some(node) = self.nodes.get(&descriptor.path) {
            node.release(LockHolder {
                session: descriptor.session,
                descriptor: descriptor.descriptor,
            });
        }
    }

    fn node_for(&self, descriptor: &NodeDescriptor) -> Option<Arc<NodeInfo>> {
        self.sessions.descriptor(descriptor)?;
        self.nodes.get(&descriptor.path)
    }

    // -- read side, bypassing the log --

    pub fn session_exists(&self, session: SessionKey) -> bool {
        self.sessions.contains(session)
    }

    pub fn session_keys(&self) -> Vec<SessionKey> {
        self.sessions.session_keys()
    }

    pub fn descriptor(&self, descriptor: &NodeDescriptor) -> Option<DescriptorMeta> {
        self.sessions.descriptor(descriptor)
    }

    pub fn descriptor_keys_for_path(
        &self,
        session: SessionKey,
        path: &NodePath,
    ) -> Vec<DescriptorKey> {
        self.sessions.descriptor_keys_for_path(session, path)
    }

    pub fn content_and_stat(&self, path: &NodePath) -> Option<NodeContentAndStat> {
        self.nodes.get(path).map(|node| node.content_and_stat())
    }

    pub fn stat(&self, path: &NodePath) -> Option<NodeStat> {
        self.nodes.get(path).map(|node| node.stat())
    }

    pub fn locker(&self, path: &NodePath) -> Option<LockHolder> {
        self.nodes.get(path).and_then(|node| node.locker())
    }

    pub fn unfinalized(&self) -> Vec<Arc<NodeInfo>> {
        self.nodes.unfinalized()
    }
}

#[cfg(test)]
#[path = "fsm_tests.rs"]
mod tests;

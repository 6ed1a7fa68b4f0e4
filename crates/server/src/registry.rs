// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session and descriptor registry.
//!
//! Two nested tables: session key to session, and within a session,
//! descriptor key to descriptor metadata plus a by-path index used for
//! event fan-out. Keys are minted monotonically inside the table so the
//! sequence is a pure function of the command log.

use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;

use warden_core::{DescriptorKey, EventsConfig, NodeDescriptor, NodePath, SessionKey};

/// Snapshot of one descriptor's registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorMeta {
    pub descriptor: NodeDescriptor,
    pub read_only: bool,
    pub events: EventsConfig,
}

struct DescriptorState {
    path: NodePath,
    read_only: bool,
    events: EventsConfig,
}

struct SessionEntry {
    next_descriptor: u64,
    descriptors: HashMap<DescriptorKey, DescriptorState>,
    by_path: HashMap<NodePath, BTreeSet<DescriptorKey>>,
}

impl SessionEntry {
    fn new() -> Self {
        Self { next_descriptor: 0, descriptors: HashMap::new(), by_path: HashMap::new() }
    }
}

#[derive(Default)]
struct TableState {
    next_session: u64,
    sessions: HashMap<SessionKey, SessionEntry>,
}

/// The session table. Concurrent reads, exclusive writes.
#[derive(Default)]
pub struct SessionTable {
    inner: RwLock<TableState>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next session key and create its entry.
    pub fn open_session(&self) -> SessionKey {
        let mut state = self.inner.write();
        state.next_session += 1;
        let key = SessionKey(state.next_session);
        state.sessions.insert(key, SessionEntry::new());
        key
    }

    /// Drop a session and every descriptor in it. Returns the paths the
    /// session had descriptors on, so the caller can clean up locks.
    pub fn close_session(&self, session: SessionKey) -> Option<Vec<NodeDescriptor>> {
        let mut state = self.inner.write();
        let entry = state.sessions.remove(&session)?;
        Some(
            entry
                .descriptors
                .into_iter()
                .map(|(key, descriptor)| NodeDescriptor::new(session, key, descriptor.path))
                .collect(),
        )
    }

    pub fn contains(&self, session: SessionKey) -> bool {
        self.inner.read().sessions.contains_key(&session)
    }

    pub fn session_keys(&self) -> Vec<SessionKey> {
        self.inner.read().sessions.keys().copied().collect()
    }

    /// Mint the next descriptor key in `session` and index it both ways.
    /// Returns `None` when the session does not exist.
    pub fn open_descriptor(
        &self,
        session: SessionKey,
        path: &NodePath,
        read_only: bool,
        events: EventsConfig,
    ) -> Option<NodeDescriptor> {
        let mut state = self.inner.write();
        let entry = state.sessions.get_mut(&session)?;
        entry.next_descriptor += 1;
        let key = DescriptorKey(entry.next_descriptor);
        entry.descriptors.insert(key, DescriptorState { path: path.clone(), read_only, events });
        entry.by_path.entry(path.clone()).or_default().insert(key);
        Some(NodeDescriptor::new(session, key, path.clone()))
    }

    /// Remove a descriptor from both indexes.
    pub fn close_descriptor(&self, descriptor: &NodeDescriptor) -> bool {
        let mut state = self.inner.write();
        let Some(entry) = state.sessions.get_mut(&descriptor.session) else {
            return false;
        };
        let Some(removed) = entry.descriptors.remove(&descriptor.descriptor) else {
            return false;
        };
        if let Some(keys) = entry.by_path.get_mut(&removed.path) {
            keys.remove(&descriptor.descriptor);
            if keys.is_empty() {
                entry.by_path.remove(&removed.path);
            }
        }
        true
    }

    /// Look up a descriptor, validating that the presented path matches
    /// the registered one.
    pub fn descriptor(&self, descriptor: &NodeDescriptor) -> Option<DescriptorMeta> {
        let state = self.inner.read();
        let entry = state.sessions.get(&descriptor.session)?;
        let found = entry.descriptors.get(&descriptor.descriptor)?;
        if found.path != descriptor.path {
            return None;
        }
        Some(DescriptorMeta {
            descriptor: descriptor.clone(),
            read_only: found.read_only,
            events: found.events,
        })
    }

    /// Which descriptors in `session` watch `path`. Used by fan-out.
    pub fn descriptor_keys_for_path(
        &self,
        session: SessionKey,
        path: &NodePath,
    ) -> Vec<DescriptorKey> {
        let state = self.inner.read();
        state
            .sessions
            .get(&session)
            .and_then(|entry| entry.by_path.get(path))
            .map(|keys| keys.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

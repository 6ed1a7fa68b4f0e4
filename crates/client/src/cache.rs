// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side content cache and held-lock set.
//!
//! The cache is warmed by reads and push events and emptied by
//! invalidations and closes; the lock set mirrors what the server thinks
//! this session holds and rides on every KeepAlive as the lease.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use warden_core::{EventInfo, NodeContentAndStat, NodeDescriptor};

/// Descriptor-keyed content cache.
#[derive(Default)]
pub(crate) struct NodeCache {
    entries: RwLock<HashMap<NodeDescriptor, NodeContentAndStat>>,
}

impl NodeCache {
    pub fn get(&self, descriptor: &NodeDescriptor) -> Option<NodeContentAndStat> {
        self.entries.read().get(descriptor).cloned()
    }

    pub fn put(&self, descriptor: NodeDescriptor, cas: NodeContentAndStat) {
        self.entries.write().insert(descriptor, cas);
    }

    pub fn remove(&self, descriptor: &NodeDescriptor) {
        self.entries.write().remove(descriptor);
    }

    /// Snapshot of cached generations, carried on KeepAlive for the
    /// pull-mode resync the protocol reserves.
    pub fn event_infos(&self) -> Vec<EventInfo> {
        self.entries
            .read()
            .iter()
            .map(|(descriptor, cas)| EventInfo {
                descriptor: descriptor.clone(),
                generation: cas.stat.generation,
                push: true,
            })
            .collect()
    }
}

/// Locks this session believes it holds.
#[derive(Default)]
pub(crate) struct LockSet {
    held: RwLock<HashSet<NodeDescriptor>>,
}

impl LockSet {
    pub fn contains(&self, descriptor: &NodeDescriptor) -> bool {
        self.held.read().contains(descriptor)
    }

    pub fn add(&self, descriptor: NodeDescriptor) {
        self.held.write().insert(descriptor);
    }

    pub fn remove(&self, descriptor: &NodeDescriptor) {
        self.held.write().remove(descriptor);
    }

    pub fn locked_nodes(&self) -> Vec<NodeDescriptor> {
        self.held.read().iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

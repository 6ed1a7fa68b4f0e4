// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lazily-populated map of per-path async mutexes.
//!
//! Entries are created on first touch and never evicted; the map is
//! bounded by the number of distinct paths ever serialized, which is
//! acceptable for this workload.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use warden_core::NodePath;

#[derive(Default)]
pub struct MutexMap {
    inner: Mutex<HashMap<NodePath, Arc<tokio::sync::Mutex<()>>>>,
}

impl MutexMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `path`, created on first access.
    pub fn handle(&self, path: &NodePath) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock();
        map.entry(path.clone()).or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))).clone()
    }
}

#[cfg(test)]
#[path = "mutex_map_tests.rs"]
mod tests;

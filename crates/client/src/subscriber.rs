// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path-keyed callback registry and its dispatch rules.
//!
//! A bare invalidation triggers a pull for fresh content before the
//! callback fires; a push event fires it directly with the piggy-backed
//! value. A panicking callback is caught and logged; the subscriber keeps
//! running.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::error;

use warden_core::{NodeContentAndStat, NodePath};

/// Invoked with the path and its fresh content after an invalidation.
pub type SubscriberCallback = Arc<dyn Fn(&NodePath, &NodeContentAndStat) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Subscriptions {
    callbacks: RwLock<HashMap<NodePath, SubscriberCallback>>,
}

impl Subscriptions {
    pub fn register(&self, path: NodePath, callback: SubscriberCallback) {
        self.callbacks.write().insert(path, callback);
    }

    /// Fire the callback registered for `path`, if any, shielding the
    /// dispatch loop from panics inside it.
    pub fn dispatch(&self, path: &NodePath, cas: &NodeContentAndStat) {
        let Some(callback) = self.callbacks.read().get(path).map(Arc::clone) else {
            return;
        };
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| callback(path, cas)));
        if result.is_err() {
            error!(%path, "subscriber callback panicked");
        }
    }
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;

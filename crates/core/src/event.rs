// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invalidation events delivered piggy-backed on KeepAlive replies.
//!
//! Serializes with `{"type": "kind", ...fields}` format so the wire codec
//! can decode the union without out-of-band registration.

use serde::{Deserialize, Serialize};

use crate::keys::NodeDescriptor;
use crate::node::NodeContentAndStat;

/// Which event kinds a descriptor wants delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Deliver content pushes instead of bare invalidations.
    #[serde(default)]
    pub content_modified: bool,
    #[serde(default)]
    pub lock_invalidated: bool,
    #[serde(default)]
    pub master_failed: bool,
}

impl EventsConfig {
    /// Config that asks for pushed content on every modification.
    pub fn push() -> Self {
        Self { content_modified: true, ..Self::default() }
    }
}

/// Events that invalidate client-side state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A lock the client held is gone (its session was declared dead).
    #[serde(rename = "lock:invalidated")]
    LockInvalidated { descriptor: NodeDescriptor },

    /// Cached content for the descriptor is stale; pull to refresh.
    #[serde(rename = "content:invalidated")]
    ContentInvalidated { descriptor: NodeDescriptor },

    /// Cached content is stale; the new value rides along.
    #[serde(rename = "content:push")]
    ContentPush { descriptor: NodeDescriptor, cas: NodeContentAndStat },
}

impl Event {
    /// The descriptor this event targets.
    pub fn descriptor(&self) -> &NodeDescriptor {
        match self {
            Event::LockInvalidated { descriptor }
            | Event::ContentInvalidated { descriptor }
            | Event::ContentPush { descriptor, .. } => descriptor,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

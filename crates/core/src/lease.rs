// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! KeepAlive payload types.

use serde::{Deserialize, Serialize};

use crate::keys::{NodeDescriptor, SessionKey};

/// What the client believes about its session: identity plus the set of
/// locks it thinks it holds. The server reconciles the lock set against
/// replicated state and invalidates stale claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseInfo {
    pub session: SessionKey,
    #[serde(default)]
    pub locked_nodes: Vec<NodeDescriptor>,
}

impl LeaseInfo {
    pub fn new(session: SessionKey) -> Self {
        Self { session, locked_nodes: Vec::new() }
    }
}

/// Per-descriptor cache snapshot carried on KeepAlive.
///
/// Reserved for a pull-mode resync after failover; the primary protocol
/// keeps invalidation state on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub descriptor: NodeDescriptor,
    pub generation: u64,
    pub push: bool,
}

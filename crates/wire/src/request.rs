// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use warden_core::{EventInfo, EventsConfig, LeaseInfo, NodeDescriptor, NodePath, SessionKey};

/// Request from client to replica.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Liveness probe, answered by any replica
    Ping,

    /// Start a session
    OpenSession,

    /// End a session and drop all its descriptors
    CloseSession { session: SessionKey },

    /// Open a descriptor on a node, creating the node on first touch
    Open {
        session: SessionKey,
        path: NodePath,
        read_only: bool,
        #[serde(default)]
        events: EventsConfig,
    },

    /// Close one descriptor
    CloseNode { descriptor: NodeDescriptor },

    /// Rolling liveness call; events ride back on the reply
    KeepAlive {
        lease: LeaseInfo,
        #[serde(default)]
        event_info: Vec<EventInfo>,
        /// Server-side wait bound in milliseconds
        max_delay_ms: u64,
    },

    /// Block until the exclusive lock is held
    Acquire { descriptor: NodeDescriptor },

    /// One acquisition attempt
    TryAcquire { descriptor: NodeDescriptor },

    /// Give up the lock
    Release { descriptor: NodeDescriptor },

    /// Read content plus stat in one snapshot
    GetContentAndStat { descriptor: NodeDescriptor },

    /// Read just the stat
    GetStat { descriptor: NodeDescriptor },

    /// Generation-gated write
    SetContent {
        descriptor: NodeDescriptor,
        content: Vec<u8>,
        min_generation: u64,
    },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

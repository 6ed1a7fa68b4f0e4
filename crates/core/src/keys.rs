// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session and descriptor keys.
//!
//! Keys are opaque numeric tokens minted monotonically by the replicated
//! state machine: one counter for sessions, one per session for descriptors.
//! They are the only handles the wire protocol speaks. They are not bearer
//! tokens across a full cluster restart: a new leader rebuilds its tables
//! from the replicated log, not from anything the client presents.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::path::NodePath;

/// Key of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(pub u64);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Key of a node descriptor within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptorKey(pub u64);

impl fmt::Display for DescriptorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// A per-session handle to a node.
///
/// Carries the owning session, the descriptor key within that session, and
/// the node path, so the server can validate it and the client can route
/// events without further lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub session: SessionKey,
    pub descriptor: DescriptorKey,
    pub path: NodePath,
}

impl NodeDescriptor {
    pub fn new(session: SessionKey, descriptor: DescriptorKey, path: NodePath) -> Self {
        Self { session, descriptor, path }
    }
}

impl fmt::Display for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.session, self.descriptor, self.path)
    }
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;

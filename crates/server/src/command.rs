// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replicated commands.
//!
//! Every state-mutating operation maps to exactly one command; read-only
//! operations never touch the log. Commands carry the proposer's request
//! id so the commit reader can wake the originating call, and any wall
//! clock value is produced by the proposer and carried in the command;
//! apply never reads a clock.

use serde::{Deserialize, Serialize};

use warden_core::{EventsConfig, NodeDescriptor, NodePath, SessionKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Command {
    #[serde(rename = "session:open")]
    OpenSession { id: u64 },

    #[serde(rename = "session:close")]
    CloseSession { id: u64, session: SessionKey },

    #[serde(rename = "node:open")]
    OpenNode {
        id: u64,
        session: SessionKey,
        path: NodePath,
        read_only: bool,
        events: EventsConfig,
    },

    #[serde(rename = "node:close")]
    CloseNode { id: u64, descriptor: NodeDescriptor },

    #[serde(rename = "lock:set")]
    SetLocked { id: u64, descriptor: NodeDescriptor },

    #[serde(rename = "lock:release")]
    ReleaseLock { id: u64, descriptor: NodeDescriptor },

    #[serde(rename = "content:prepare")]
    PrepareSet {
        id: u64,
        descriptor: NodeDescriptor,
        content: Vec<u8>,
        min_generation: u64,
        modified_ms: u64,
    },

    #[serde(rename = "content:finalize")]
    FinalizeSet { id: u64, path: NodePath },
}

impl Command {
    /// The proposer's request id.
    pub fn id(&self) -> u64 {
        match self {
            Command::OpenSession { id }
            | Command::CloseSession { id, .. }
            | Command::OpenNode { id, .. }
            | Command::CloseNode { id, .. }
            | Command::SetLocked { id, .. }
            | Command::ReleaseLock { id, .. }
            | Command::PrepareSet { id, .. }
            | Command::FinalizeSet { id, .. } => *id,
        }
    }

    /// Log-entry encoding, shared with the wire codec's format.
    pub fn encode(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::encode::to_vec_named(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::decode::from_slice(bytes)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;

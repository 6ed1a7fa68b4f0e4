// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination error kinds.
//!
//! These cross the wire as the string payload of an error response. The
//! redirect kind serializes its leader hint as JSON so a client can parse
//! the target out of the message; every other kind is a fixed string.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the leader lives, carried inside a redirect error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderHint {
    #[serde(rename = "LeaderID")]
    pub leader_id: u64,
    #[serde(rename = "LeaderAddr")]
    pub leader_addr: String,
}

/// Application-level failures of coordination operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    #[error("invalid session descriptor")]
    InvalidSessionDescriptor,

    #[error("invalid node descriptor")]
    InvalidNodeDescriptor,

    #[error("read-only node descriptor")]
    ReadOnlyDescriptor,

    #[error("lock not held")]
    LockNotHeld,

    #[error("no leader")]
    NoLeader,

    /// This replica is not the leader; retry against the hinted address.
    #[error("redirect to leader {} at {}", .0.leader_id, .0.leader_addr)]
    Redirect(LeaderHint),

    /// A proposed command never came back from the log.
    #[error("commit timed out")]
    Timeout,

    /// Server-side failure that is not the caller's fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoordError {
    /// Wire form: the error-response message string.
    pub fn wire_message(&self) -> String {
        match self {
            CoordError::Redirect(hint) => {
                serde_json::to_string(hint).unwrap_or_else(|_| "no leader".to_string())
            }
            CoordError::InvalidSessionDescriptor => "invalid session descriptor".to_string(),
            CoordError::InvalidNodeDescriptor => "invalid node descriptor".to_string(),
            CoordError::ReadOnlyDescriptor => "read-only node descriptor".to_string(),
            CoordError::LockNotHeld => "lock not held".to_string(),
            CoordError::NoLeader => "no leader".to_string(),
            CoordError::Timeout => "commit timed out".to_string(),
            CoordError::Internal(detail) => format!("internal error: {detail}"),
        }
    }

    /// Parse a wire message back into an error kind.
    ///
    /// The redirect shape is tried first; an unrecognized message maps to
    /// `NoLeader` only if it says so, otherwise it is surfaced verbatim by
    /// the caller's transport layer.
    pub fn from_wire_message(message: &str) -> Option<Self> {
        if let Ok(hint) = serde_json::from_str::<LeaderHint>(message) {
            return Some(CoordError::Redirect(hint));
        }
        if let Some(detail) = message.strip_prefix("internal error: ") {
            return Some(CoordError::Internal(detail.to_string()));
        }
        match message {
            "invalid session descriptor" => Some(CoordError::InvalidSessionDescriptor),
            "invalid node descriptor" => Some(CoordError::InvalidNodeDescriptor),
            "read-only node descriptor" => Some(CoordError::ReadOnlyDescriptor),
            "lock not held" => Some(CoordError::LockNotHeld),
            "no leader" => Some(CoordError::NoLeader),
            "commit timed out" => Some(CoordError::Timeout),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use warden_core::{Event, NodeContentAndStat, NodeDescriptor, NodeStat, SessionKey};

/// Response from replica to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Liveness probe response
    Pong,

    /// Session opened
    Session { session: SessionKey },

    /// Descriptor opened
    Node { descriptor: NodeDescriptor },

    /// KeepAlive reply: buffered events, possibly none
    Events { events: Vec<Event> },

    /// TryAcquire outcome
    Acquired { acquired: bool },

    /// Content snapshot
    Content { cas: NodeContentAndStat },

    /// Stat snapshot
    Stat { stat: NodeStat },

    /// SetContent outcome; false means the generation gate rejected it
    Set { committed: bool },

    /// Error response; redirect errors carry a JSON leader hint here
    Error { message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;

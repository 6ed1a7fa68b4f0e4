// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use warden_core::CoordError;
use warden_wire::WireError;

/// Errors surfaced by the client runtime.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Application-level failure from the server.
    #[error(transparent)]
    Coord(#[from] CoordError),

    /// The connection to a replica failed.
    #[error("transport error: {0}")]
    Transport(#[from] WireError),

    /// The server answered with something the call did not expect.
    #[error("unexpected response: {0}")]
    Protocol(String),

    /// No server in the configured set responded within a full cycle.
    #[error("jeopardy: no reachable server")]
    Jeopardy,
}

impl ClientError {
    /// True when retrying against another replica could help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Jeopardy)
    }
}

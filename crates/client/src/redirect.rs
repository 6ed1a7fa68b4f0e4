// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leader-following shim over the replica set.
//!
//! Holds the ordered address list. While the leader is unknown it walks
//! the list; a redirect error pins the leader directly; a transport error
//! drops the leader and resumes walking. One full unsuccessful cycle
//! surfaces as jeopardy instead of spinning forever.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use warden_core::{
    CoordError, Event, EventInfo, EventsConfig, LeaseInfo, NodeContentAndStat, NodeDescriptor,
    NodePath, NodeStat, SessionKey,
};

use crate::error::ClientError;
use crate::transport::ServerApi;

struct LeaderState {
    /// 1-based index of the known leader; 0 means unknown.
    leader: usize,
    /// 1-based index tried while the leader is unknown.
    pending: usize,
}

pub struct RedirectClient {
    delegates: Vec<Arc<dyn ServerApi>>,
    state: Mutex<LeaderState>,
}

/// Drive one RPC through the redirect state machine.
macro_rules! with_redirect {
    ($self:ident, $server:ident => $call:expr) => {{
        // Redirect chasing is bounded: a healthy cluster resolves in two
        // hops, so anything longer is a livelock between stale leaders.
        let mut hops = 2 * $self.delegates.len() + 2;
        loop {
            let $server = $self.current();
            match $call.await {
                Ok(value) => {
                    $self.stabilize();
                    break Ok(value);
                }
                Err(ClientError::Coord(CoordError::Redirect(hint))) => {
                    debug!(leader_id = hint.leader_id, addr = %hint.leader_addr, "following redirect");
                    $self.set_leader(hint.leader_id);
                }
                Err(ClientError::Transport(err)) => {
                    warn!(%err, "replica unreachable, advancing");
                    if !$self.abort_leader() {
                        break Err(ClientError::Jeopardy);
                    }
                }
                Err(other) => break Err(other),
            }
            hops -= 1;
            if hops == 0 {
                break Err(ClientError::Jeopardy);
            }
        }
    }};
}

impl RedirectClient {
    pub fn new(delegates: Vec<Arc<dyn ServerApi>>) -> Self {
        assert!(!delegates.is_empty(), "redirect client needs at least one address");
        Self { delegates, state: Mutex::new(LeaderState { leader: 0, pending: 1 }) }
    }

    fn current(&self) -> Arc<dyn ServerApi> {
        let state = self.state.lock();
        let index = if state.leader != 0 { state.leader } else { state.pending };
        Arc::clone(&self.delegates[index - 1])
    }

    /// A successful call promotes the address we tried into the leader
    /// slot, if none was pinned.
    fn stabilize(&self) {
        let mut state = self.state.lock();
        if state.leader == 0 {
            state.leader = state.pending;
        }
    }

    /// Pin the leader named by a redirect. Ids index the address list.
    fn set_leader(&self, leader_id: u64) {
        let mut state = self.state.lock();
        let id = leader_id as usize;
        if id >= 1 && id <= self.delegates.len() {
            state.leader = id;
        } else {
            // hint points outside the configured set; fall back to walking
            state.leader = 0;
            state.pending = 1;
        }
    }

    /// Drop the current target after a transport failure. Returns false
    /// once a full cycle through the list has failed.
    fn abort_leader(&self) -> bool {
        let mut state = self.state.lock();
        if state.leader != 0 {
            state.leader = 0;
            state.pending = 1;
            true
        } else if state.pending < self.delegates.len() {
            state.pending += 1;
            true
        } else {
            state.pending = 1;
            false
        }
    }
}

#[async_trait]
impl ServerApi for RedirectClient {
    async fn ping(&self) -> Result<(), ClientError> {
        with_redirect!(self, server => server.ping())
    }

    async fn open_session(&self) -> Result<SessionKey, ClientError> {
        with_redirect!(self, server => server.open_session())
    }

    async fn close_session(&self, session: SessionKey) -> Result<(), ClientError> {
        with_redirect!(self, server => server.close_session(session))
    }

    async fn open(
        &self,
        session: SessionKey,
        path: NodePath,
        read_only: bool,
        events: EventsConfig,
    ) -> Result<NodeDescriptor, ClientError> {
        with_redirect!(self, server => server.open(session, path.clone(), read_only, events))
    }

    async fn close_node(&self, descriptor: NodeDescriptor) -> Result<(), ClientError> {
        with_redirect!(self, server => server.close_node(descriptor.clone()))
    }

    async fn keep_alive(
        &self,
        lease: LeaseInfo,
        event_info: Vec<EventInfo>,
        max_delay: Duration,
    ) -> Result<Vec<Event>, ClientError> {
        with_redirect!(self, server => server.keep_alive(lease.clone(), event_info.clone(), max_delay))
    }

    async fn acquire(&self, descriptor: NodeDescriptor) -> Result<(), ClientError> {
        with_redirect!(self, server => server.acquire(descriptor.clone()))
    }

    async fn try_acquire(&self, descriptor: NodeDescriptor) -> Result<bool, ClientError> {
        with_redirect!(self, server => server.try_acquire(descriptor.clone()))
    }

    async fn release(&self, descriptor: NodeDescriptor) -> Result<(), ClientError> {
        with_redirect!(self, server => server.release(descriptor.clone()))
    }

    async fn get_content_and_stat(
        &self,
        descriptor: NodeDescriptor,
    ) -> Result<NodeContentAndStat, ClientError> {
        with_redirect!(self, server => server.get_content_and_stat(descriptor.clone()))
    }

    async fn get_stat(&self, descriptor: NodeDescriptor) -> Result<NodeStat, ClientError> {
        with_redirect!(self, server => server.get_stat(descriptor.clone()))
    }

    async fn set_content(
        &self,
        descriptor: NodeDescriptor,
        content: Vec<u8>,
        min_generation: u64,
    ) -> Result<bool, ClientError> {
        with_redirect!(self, server => server.set_content(descriptor.clone(), content.clone(), min_generation))
    }
}

#[cfg(test)]
#[path = "redirect_tests.rs"]
mod tests;

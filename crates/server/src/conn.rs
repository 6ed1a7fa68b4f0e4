// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session connection state on the leader.
//!
//! Volatile by design: rebuilt from the replicated session table on every
//! leadership transition, never persisted. Tracks the liveness proxy
//! (in-KeepAlive flag plus last-KeepAlive stamp), the queue of events
//! waiting for the next KeepAlive, and the acks owed for events already
//! returned.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};

use warden_core::{Clock, Event};

struct PendingEvent {
    event: Event,
    ack: oneshot::Sender<()>,
}

struct ConnState {
    in_keep_alive: bool,
    last_keep_alive: Instant,
    pending: VecDeque<PendingEvent>,
    /// Acks for events returned on the last KeepAlive, released when the
    /// session calls again.
    owed_acks: Vec<oneshot::Sender<()>>,
}

pub struct SessionConn {
    clock: Arc<dyn Clock>,
    state: Mutex<ConnState>,
    /// One-shot wake-up edge for a parked KeepAlive. `notify_one` stores a
    /// permit when nobody is parked, so signals and waits may race in
    /// either order; repeated signals coalesce into one wake.
    signal: Notify,
}

impl SessionConn {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            clock,
            state: Mutex::new(ConnState {
                in_keep_alive: false,
                last_keep_alive: now,
                pending: VecDeque::new(),
                owed_acks: Vec::new(),
            }),
            signal: Notify::new(),
        }
    }

    pub fn enter_keep_alive(&self) {
        self.state.lock().in_keep_alive = true;
    }

    pub fn exit_keep_alive(&self) {
        let mut state = self.state.lock();
        state.in_keep_alive = false;
        state.last_keep_alive = self.clock.now();
    }

    /// A session is alive while it sits in a KeepAlive or called one
    /// recently enough.
    pub fn is_alive(&self, threshold: Duration) -> bool {
        let state = self.state.lock();
        state.in_keep_alive || self.clock.now().duration_since(state.last_keep_alive) < threshold
    }

    /// Queue an event and block until the target session acks it on its
    /// next KeepAlive, or give up after `timeout` and report the session
    /// dead to the caller.
    pub async fn send_event(&self, event: Event, timeout: Duration) -> bool {
        let (ack, delivered) = oneshot::channel();
        self.state.lock().pending.push_back(PendingEvent { event, ack });
        self.signal.notify_one();

        tokio::time::timeout(timeout, delivered).await.map(|result| result.is_ok()).unwrap_or(false)
    }

    /// Drain the pending queue in enqueue order. The drained events' acks
    /// become owed and are released by [`ack_delivered`] on the next call.
    ///
    /// [`ack_delivered`]: SessionConn::ack_delivered
    pub fn read_events(&self) -> Vec<Event> {
        let mut state = self.state.lock();
        let mut events = Vec::with_capacity(state.pending.len());
        while let Some(pending) = state.pending.pop_front() {
            events.push(pending.event);
            state.owed_acks.push(pending.ack);
        }
        events
    }

    /// Release publishers whose events went out on the previous KeepAlive.
    pub fn ack_delivered(&self) {
        let owed = std::mem::take(&mut self.state.lock().owed_acks);
        for ack in owed {
            let _ = ack.send(());
        }
    }

    /// Wait for the next signal edge.
    pub async fn signalled(&self) {
        self.signal.notified().await;
    }

    pub fn has_pending(&self) -> bool {
        !self.state.lock().pending.is_empty()
    }
}

#[cfg(test)]
#[path = "conn_tests.rs"]
mod tests;

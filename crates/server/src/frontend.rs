// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public server surface.
//!
//! Every call (except ping) first checks leadership and redirects to the
//! current leader otherwise. Mutations go through the raft bridge; reads
//! come straight from the deterministic FSM. The frontend owns everything
//! the log does not: session liveness, the event queues, per-path
//! serialization of acquires and publishes, and the takeover that resumes
//! interrupted fan-outs on a new leader.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use warden_core::{
    Clock, CoordError, Event, EventInfo, EventsConfig, LeaderHint, LeaseInfo, NodeContentAndStat,
    NodeDescriptor, NodePath, NodeStat, SessionKey,
};

use crate::bridge::RaftBridge;
use crate::conn::SessionConn;
use crate::mutex_map::MutexMap;
use crate::raft::ClusterState;
use crate::store::LockHolder;

/// Server-side cap on one KeepAlive's wait.
pub const MAX_KEEPALIVE_DELAY: Duration = Duration::from_secs(3);

/// A session missing KeepAlives for this long is dead. Also bounds how
/// long a publisher blocks on one session's ack.
pub const TIMEOUT_THRESHOLD: Duration = Duration::from_secs(9);

/// Pause between TryAcquire rounds inside a blocking Acquire.
const ACQUIRE_RETRY_DELAY: Duration = Duration::from_millis(10);

pub struct Frontend {
    bridge: Arc<RaftBridge>,
    conns: RwLock<HashMap<SessionKey, Arc<SessionConn>>>,
    cluster: watch::Receiver<ClusterState>,
    /// Serializes acquire contention per path.
    acquire_gates: MutexMap,
    /// Serializes PrepareSet..FinalizeSet per path so the next write
    /// cannot race an in-flight fan-out.
    publish_gates: MutexMap,
    clock: Arc<dyn Clock>,
}

impl Frontend {
    /// Build the frontend and start its leadership watcher.
    pub fn start(
        bridge: Arc<RaftBridge>,
        cluster: watch::Receiver<ClusterState>,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        let frontend = Arc::new(Self {
            bridge,
            conns: RwLock::new(HashMap::new()),
            cluster: cluster.clone(),
            acquire_gates: MutexMap::new(),
            publish_gates: MutexMap::new(),
            clock,
        });
        tokio::spawn(Arc::clone(&frontend).watch_leadership(cluster, shutdown));
        frontend
    }

    fn check_leader(&self) -> Result<(), CoordError> {
        let state = self.cluster.borrow().clone();
        if state.is_leader {
            Ok(())
        } else if state.leader_addr.is_empty() {
            Err(CoordError::NoLeader)
        } else {
            Err(CoordError::Redirect(LeaderHint {
                leader_id: state.leader_id,
                leader_addr: state.leader_addr,
            }))
        }
    }

    fn conn(&self, session: SessionKey) -> Option<Arc<SessionConn>> {
        self.conns.read().get(&session).cloned()
    }

    // -- sessions --

    pub async fn open_session(&self) -> Result<SessionKey, CoordError> {
        self.check_leader()?;
        let session = self.bridge.open_session().await?;
        self.conns.write().insert(session, Arc::new(SessionConn::new(self.clock.clone())));
        debug!(%session, "session opened");
        Ok(session)
    }

    pub async fn close_session(&self, session: SessionKey) -> Result<(), CoordError> {
        self.check_leader()?;
        if !self.bridge.fsm().session_exists(session) {
            return Err(CoordError::InvalidSessionDescriptor);
        }
        self.bridge.close_session(session).await?;
        self.conns.write().remove(&session);
        debug!(%session, "session closed");
        Ok(())
    }

    // -- descriptors --

    pub async fn open(
        &self,
        session: SessionKey,
        path: NodePath,
        read_only: bool,
        events: EventsConfig,
    ) -> Result<NodeDescriptor, CoordError> {
        self.check_leader()?;
        if !self.bridge.fsm().session_exists(session) {
            return Err(CoordError::InvalidSessionDescriptor);
        }
        self.bridge
            .open_node(session, path, read_only, events)
            .await?
            .ok_or(CoordError::InvalidSessionDescriptor)
    }

    pub async fn close_node(&self, descriptor: &NodeDescriptor) -> Result<(), CoordError> {
        self.check_leader()?;
        if self.bridge.fsm().descriptor(descriptor).is_none() {
            return Err(CoordError::InvalidNodeDescriptor);
        }
        self.bridge.close_node(descriptor.clone()).await
    }

    // -- keepalive --

    /// Rolling liveness call. Acks the events returned last time, then
    /// parks until the delay elapses or an event arrives, and drains the
    /// queue into the reply.
    pub async fn keep_alive(
        &self,
        lease: LeaseInfo,
        _event_info: Vec<EventInfo>,
        max_delay: Duration,
    ) -> Result<Vec<Event>, CoordError> {
        self.check_leader()?;
        let conn = self.conn(lease.session).ok_or(CoordError::InvalidSessionDescriptor)?;

        conn.enter_keep_alive();
        let events = self.keep_alive_locked(&conn, &lease, max_delay).await;
        conn.exit_keep_alive();
        Ok(events)
    }

    async fn keep_alive_locked(
        &self,
        conn: &SessionConn,
        lease: &LeaseInfo,
        max_delay: Duration,
    ) -> Vec<Event> {
        conn.ack_delivered();

        // Reconcile the lock set the client claims against replicated
        // state; stale claims come back as immediate invalidations.
        let mut events = self.stale_lock_events(lease);

        if events.is_empty() && !conn.has_pending() {
            let delay = max_delay.min(MAX_KEEPALIVE_DELAY);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = conn.signalled() => {}
            }
        }
        events.extend(conn.read_events());
        events
    }

    fn stale_lock_events(&self, lease: &LeaseInfo) -> Vec<Event> {
        lease
            .locked_nodes
            .iter()
            .filter(|nd| {
                self.bridge.fsm().locker(&nd.path)
                    != Some(LockHolder { session: nd.session, descriptor: nd.descriptor })
            })
            .map(|nd| Event::LockInvalidated { descriptor: nd.clone() })
            .collect()
    }

    // -- locks --

    fn writable_descriptor(&self, descriptor: &NodeDescriptor) -> Result<(), CoordError> {
        let meta =
            self.bridge.fsm().descriptor(descriptor).ok_or(CoordError::InvalidNodeDescriptor)?;
        if meta.read_only {
            return Err(CoordError::ReadOnlyDescriptor);
        }
        Ok(())
    }

    /// One acquisition attempt. Steals from a holder whose session is
    /// dead; the stolen holder gets a lock invalidation queued, delivered
    /// independently of this call.
    pub async fn try_acquire(&self, descriptor: &NodeDescriptor) -> Result<bool, CoordError> {
        self.check_leader()?;
        self.writable_descriptor(descriptor)?;

        let gate = self.acquire_gates.handle(&descriptor.path);
        let _guard = gate.lock().await;

        let holder = LockHolder { session: descriptor.session, descriptor: descriptor.descriptor };
        match self.bridge.fsm().locker(&descriptor.path) {
            None => {
                self.bridge.set_locked(descriptor.clone()).await?;
                Ok(true)
            }
            Some(current) if current == holder => Ok(false),
            Some(current) => {
                let current_conn = self.conn(current.session);
                let alive = current_conn
                    .as_ref()
                    .map(|conn| conn.is_alive(TIMEOUT_THRESHOLD))
                    .unwrap_or(false);
                if alive {
                    return Ok(false);
                }

                info!(path = %descriptor.path, holder = %current.session, "stealing lock from dead session");
                self.bridge.set_locked(descriptor.clone()).await?;

                if let Some(conn) = current_conn {
                    let event = Event::LockInvalidated {
                        descriptor: NodeDescriptor::new(
                            current.session,
                            current.descriptor,
                            descriptor.path.clone(),
                        ),
                    };
                    tokio::spawn(async move {
                        conn.send_event(event, TIMEOUT_THRESHOLD).await;
                    });
                }
                Ok(true)
            }
        }
    }

    /// TryAcquire in a loop until it lands.
    pub async fn acquire(&self, descriptor: &NodeDescriptor) -> Result<(), CoordError> {
        loop {
            if self.try_acquire(descriptor).await? {
                return Ok(());
            }
            tokio::time::sleep(ACQUIRE_RETRY_DELAY).await;
        }
    }

    pub async fn release(&self, descriptor: &NodeDescriptor) -> Result<(), CoordError> {
        self.check_leader()?;
        self.writable_descriptor(descriptor)?;
        if self.bridge.release(descriptor.clone()).await? {
            Ok(())
        } else {
            Err(CoordError::LockNotHeld)
        }
    }

    // -- content --

    pub fn get_content_and_stat(
        &self,
        descriptor: &NodeDescriptor,
    ) -> Result<NodeContentAndStat, CoordError> {
        self.check_leader()?;
        self.bridge.fsm().descriptor(descriptor).ok_or(CoordError::InvalidNodeDescriptor)?;
        self.bridge
            .fsm()
            .content_and_stat(&descriptor.path)
            .ok_or(CoordError::InvalidNodeDescriptor)
    }

    pub fn get_stat(&self, descriptor: &NodeDescriptor) -> Result<NodeStat, CoordError> {
        self.check_leader()?;
        self.bridge.fsm().descriptor(descriptor).ok_or(CoordError::InvalidNodeDescriptor)?;
        self.bridge.fsm().stat(&descriptor.path).ok_or(CoordError::InvalidNodeDescriptor)
    }

    /// Two-phase publish: commit the write, fan invalidations out to every
    /// watching session (or declare them dead), then commit the finalize.
    /// A leader crash between the phases leaves the node unfinalized and
    /// the next leader's takeover finishes the fan-out.
    pub async fn set_content(
        &self,
        descriptor: &NodeDescriptor,
        content: Vec<u8>,
        min_generation: u64,
    ) -> Result<bool, CoordError> {
        self.check_leader()?;
        self.writable_descriptor(descriptor)?;

        let gate = self.publish_gates.handle(&descriptor.path);
        let _guard = gate.lock().await;

        let modified_ms = self.clock.epoch_ms();
        if !self
            .bridge
            .prepare_set(descriptor.clone(), content, min_generation, modified_ms)
            .await?
        {
            return Ok(false);
        }

        let cas = self
            .bridge
            .fsm()
            .content_and_stat(&descriptor.path)
            .ok_or(CoordError::InvalidNodeDescriptor)?;
        self.fan_out(&descriptor.path, &cas, Some(descriptor)).await;
        self.bridge.finalize_set(descriptor.path.clone()).await?;
        Ok(true)
    }

    /// Send one invalidation per watching descriptor, in parallel, and
    /// wait for every target to ack or time out dead.
    async fn fan_out(
        &self,
        path: &NodePath,
        cas: &NodeContentAndStat,
        exclude: Option<&NodeDescriptor>,
    ) {
        let conns: Vec<(SessionKey, Arc<SessionConn>)> =
            self.conns.read().iter().map(|(key, conn)| (*key, Arc::clone(conn))).collect();

        let mut sends = Vec::new();
        for (session, conn) in conns {
            for key in self.bridge.fsm().descriptor_keys_for_path(session, path) {
                let target = NodeDescriptor::new(session, key, path.clone());
                if exclude == Some(&target) {
                    continue;
                }
                let Some(meta) = self.bridge.fsm().descriptor(&target) else {
                    continue;
                };
                let event = if meta.events.content_modified {
                    Event::ContentPush { descriptor: target, cas: cas.clone() }
                } else {
                    Event::ContentInvalidated { descriptor: target }
                };
                let conn = Arc::clone(&conn);
                sends.push(tokio::spawn(async move {
                    if !conn.send_event(event, TIMEOUT_THRESHOLD).await {
                        warn!(%session, "event ack timed out, session presumed dead");
                    }
                }));
            }
        }
        for send in sends {
            let _ = send.await;
        }
    }

    // -- leadership --

    async fn watch_leadership(
        self: Arc<Self>,
        mut cluster: watch::Receiver<ClusterState>,
        shutdown: CancellationToken,
    ) {
        let mut was_leader = cluster.borrow().is_leader;
        if was_leader {
            self.takeover();
        }
        loop {
            tokio::select! {
                changed = cluster.changed() => {
                    if changed.is_err() {
                        debug!("cluster watch closed, leadership watcher stopping");
                        return;
                    }
                }
                _ = shutdown.cancelled() => return,
            }
            let is_leader = cluster.borrow().is_leader;
            if is_leader && !was_leader {
                info!("became leader");
                self.takeover();
            }
            was_leader = is_leader;
        }
    }

    /// Runs when this node becomes leader: rebuild the volatile session
    /// state from the replicated table, then resume the fan-out of every
    /// write that committed without its finalize.
    fn takeover(self: &Arc<Self>) {
        {
            let mut conns = self.conns.write();
            conns.clear();
            for session in self.bridge.fsm().session_keys() {
                conns.insert(session, Arc::new(SessionConn::new(self.clock.clone())));
            }
        }

        for node in self.bridge.fsm().unfinalized() {
            let frontend = Arc::clone(self);
            tokio::spawn(async move {
                let path = node.path().clone();
                info!(%path, "resuming interrupted publish");

                let gate = frontend.publish_gates.handle(&path);
                let _guard = gate.lock().await;
                if node.is_finalized() {
                    return;
                }

                let cas = node.content_and_stat();
                frontend.fan_out(&path, &cas, None).await;
                if let Err(err) = frontend.bridge.finalize_set(path.clone()).await {
                    warn!(%path, %err, "finalize after takeover failed");
                }
            });
        }
    }
}

#[cfg(test)]
#[path = "frontend_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response rendezvous over the raft log.
//!
//! Each mutating call allocates a request id, parks a oneshot sender in
//! the per-command-type table, pushes the encoded command on the propose
//! channel, and blocks on the receiver. A single background task consumes
//! committed entries, applies them to the deterministic FSM, and wakes the
//! originating call if its id is parked here. Replicas that did not
//! originate a command apply it and move on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use warden_core::{CoordError, EventsConfig, NodeDescriptor, NodePath, SessionKey};

use crate::command::Command;
use crate::fsm::{Applied, CoordFsm};

/// Bound on the commit rendezvous. A leader that steps down before commit
/// never wakes the proposer; the caller sees a timeout and may retry.
pub const PROPOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Pending {
    sessions: Mutex<HashMap<u64, oneshot::Sender<SessionKey>>>,
    nodes: Mutex<HashMap<u64, oneshot::Sender<Option<NodeDescriptor>>>>,
    released: Mutex<HashMap<u64, oneshot::Sender<bool>>>,
    prepared: Mutex<HashMap<u64, oneshot::Sender<bool>>>,
    done: Mutex<HashMap<u64, oneshot::Sender<()>>>,
}

pub struct RaftBridge {
    fsm: Arc<CoordFsm>,
    propose: mpsc::Sender<Vec<u8>>,
    next_id: AtomicU64,
    pending: Pending,
}

impl RaftBridge {
    /// Wrap `fsm` and start the committed-log reader.
    pub fn start(
        fsm: Arc<CoordFsm>,
        propose: mpsc::Sender<Vec<u8>>,
        committed: mpsc::Receiver<Vec<u8>>,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        let bridge = Arc::new(Self {
            fsm,
            propose,
            next_id: AtomicU64::new(0),
            pending: Pending::default(),
        });
        tokio::spawn(Arc::clone(&bridge).read_from_log(committed, shutdown));
        bridge
    }

    pub fn fsm(&self) -> &CoordFsm {
        &self.fsm
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn read_from_log(
        self: Arc<Self>,
        mut committed: mpsc::Receiver<Vec<u8>>,
        shutdown: CancellationToken,
    ) {
        loop {
            let entry = tokio::select! {
                entry = committed.recv() => entry,
                _ = shutdown.cancelled() => {
                    debug!("log reader shutting down");
                    return;
                }
            };
            let Some(entry) = entry else {
                warn!("committed channel closed, log reader stopping");
                return;
            };

            let command = match Command::decode(&entry) {
                Ok(command) => command,
                Err(err) => {
                    error!(%err, "undecodable log entry, skipping");
                    continue;
                }
            };

            let id = command.id();
            match self.fsm.apply(&command) {
                Applied::Session(key) => {
                    if let Some(tx) = self.pending.sessions.lock().remove(&id) {
                        let _ = tx.send(key);
                    }
                }
                Applied::Node(nd) => {
                    if let Some(tx) = self.pending.nodes.lock().remove(&id) {
                        let _ = tx.send(nd);
                    }
                }
                Applied::Released(ok) => {
                    if let Some(tx) = self.pending.released.lock().remove(&id) {
                        let _ = tx.send(ok);
                    }
                }
                Applied::Prepared(ok) => {
                    if let Some(tx) = self.pending.prepared.lock().remove(&id) {
                        let _ = tx.send(ok);
                    }
                }
                Applied::Done => {
                    if let Some(tx) = self.pending.done.lock().remove(&id) {
                        let _ = tx.send(());
                    }
                }
            }
        }
    }

    /// Park a receiver under `id`, propose, and await the commit wake-up.
    async fn propose_and_wait<T>(
        &self,
        table: &Mutex<HashMap<u64, oneshot::Sender<T>>>,
        id: u64,
        command: Command,
    ) -> Result<T, CoordError> {
        let (tx, rx) = oneshot::channel();
        table.lock().insert(id, tx);

        let bytes = match command.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                table.lock().remove(&id);
                error!(%err, "failed to encode command");
                return Err(CoordError::Internal("command encoding failed".to_string()));
            }
        };

        if self.propose.send(bytes).await.is_err() {
            table.lock().remove(&id);
            return Err(CoordError::NoLeader);
        }

        match tokio::time::timeout(PROPOSE_TIMEOUT, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) | Err(_) => {
                table.lock().remove(&id);
                Err(CoordError::Timeout)
            }
        }
    }

    pub async fn open_session(&self) -> Result<SessionKey, CoordError> {
        let id = self.next_id();
        self.propose_and_wait(&self.pending.sessions, id, Command::OpenSession { id }).await
    }

    pub async fn close_session(&self, session: SessionKey) -> Result<(), CoordError> {
        let id = self.next_id();
        self.propose_and_wait(&self.pending.done, id, Command::CloseSession { id, session }).await
    }

    pub async fn open_node(
        &self,
        session: SessionKey,
        path: NodePath,
        read_only: bool,
        events: EventsConfig,
    ) -> Result<Option<NodeDescriptor>, CoordError> {
        let id = self.next_id();
        let command = Command::OpenNode { id, session, path, read_only, events };
        self.propose_and_wait(&self.pending.nodes, id, command).await
    }

    pub async fn close_node(&self, descriptor: NodeDescriptor) -> Result<(), CoordError> {
        let id = self.next_id();
        self.propose_and_wait(&self.pending.done, id, Command::CloseNode { id, descriptor }).await
    }

    pub async fn set_locked(&self, descriptor: NodeDescriptor) -> Result<(), CoordError> {
        let id = self.next_id();
        self.propose_and_wait(&self.pending.done, id, Command::SetLocked { id, descriptor }).await
    }

    pub async fn release(&self, descriptor: NodeDescriptor) -> Result<bool, CoordError> {
        let id = self.next_id();
        self.propose_and_wait(&self.pending.released, id, Command::ReleaseLock { id, descriptor })
            .await
    }

    pub async fn prepare_set(
        &self,
        descriptor: NodeDescriptor,
        content: Vec<u8>,
        min_generation: u64,
        modified_ms: u64,
    ) -> Result<bool, CoordError> {
        let id = self.next_id();
        let command =
            Command::PrepareSet { id, descriptor, content, min_generation, modified_ms };
        self.propose_and_wait(&self.pending.prepared, id, command).await
    }

    pub async fn finalize_set(&self, path: NodePath) -> Result<(), CoordError> {
        let id = self.next_id();
        self.propose_and_wait(&self.pending.done, id, Command::FinalizeSet { id, path }).await
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;

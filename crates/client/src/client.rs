// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client session runtime.
//!
//! `Client::connect` opens a session and starts two tasks: the rolling
//! KeepAlive loop (liveness out, events in) and the subscriber loop
//! (callback dispatch). Node handles share the session through `Arc`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use warden_core::{
    Event, EventsConfig, LeaseInfo, NodeContentAndStat, NodeDescriptor, NodePath, NodeStat,
    SessionKey,
};

use crate::cache::{LockSet, NodeCache};
use crate::error::ClientError;
use crate::redirect::RedirectClient;
use crate::subscriber::{SubscriberCallback, Subscriptions};
use crate::transport::{ServerApi, TcpTransport};

/// Floor on the KeepAlive loop period, so a degenerate delay of zero
/// cannot hot-spin against the server.
pub const MIN_KEEPALIVE_DELAY: Duration = Duration::from_millis(100);

/// Backoff after a failed KeepAlive before trying again.
pub const CONNECTION_ERROR_BACKOFF: Duration = Duration::from_secs(5);

struct ClientInner {
    server: Arc<dyn ServerApi>,
    session: SessionKey,
    cache: NodeCache,
    locks: LockSet,
    subscriptions: Subscriptions,
    keep_alive_delay: Duration,
    shutdown: CancellationToken,
}

impl ClientInner {
    /// Fold one server event into the local caches.
    fn apply_event(&self, event: &Event) {
        match event {
            Event::LockInvalidated { descriptor } => {
                warn!(path = %descriptor.path, "lock invalidated by server");
                self.locks.remove(descriptor);
            }
            Event::ContentInvalidated { descriptor } => self.cache.remove(descriptor),
            Event::ContentPush { descriptor, cas } => {
                self.cache.put(descriptor.clone(), cas.clone());
            }
        }
    }

    /// Pull fresh content and warm the cache with it.
    async fn fetch_content(
        &self,
        descriptor: &NodeDescriptor,
    ) -> Result<NodeContentAndStat, ClientError> {
        let cas = self.server.get_content_and_stat(descriptor.clone()).await?;
        self.cache.put(descriptor.clone(), cas.clone());
        Ok(cas)
    }
}

/// Handle to an open session on the cluster.
pub struct Client {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.inner.session)
            .finish()
    }
}

impl Client {
    /// Open a session against the given replica addresses.
    pub async fn connect(
        addrs: &[String],
        keep_alive_delay: Duration,
    ) -> Result<Self, ClientError> {
        let delegates = addrs
            .iter()
            .map(|addr| Arc::new(TcpTransport::new(addr)) as Arc<dyn ServerApi>)
            .collect();
        Self::with_server(Arc::new(RedirectClient::new(delegates)), keep_alive_delay).await
    }

    /// Open a session over an already-built transport. The seam the
    /// integration tests use.
    pub async fn with_server(
        server: Arc<dyn ServerApi>,
        keep_alive_delay: Duration,
    ) -> Result<Self, ClientError> {
        let session = server.open_session().await?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(ClientInner {
            server,
            session,
            cache: NodeCache::default(),
            locks: LockSet::default(),
            subscriptions: Subscriptions::default(),
            keep_alive_delay,
            shutdown: CancellationToken::new(),
        });

        tokio::spawn(keep_alive_loop(Arc::clone(&inner), events_tx));
        tokio::spawn(subscriber_loop(Arc::clone(&inner), events_rx));

        Ok(Self { inner })
    }

    pub fn session(&self) -> SessionKey {
        self.inner.session
    }

    /// Open a descriptor on `path`, creating the node on first touch.
    pub async fn open(
        &self,
        path: impl Into<NodePath>,
        read_only: bool,
        events: EventsConfig,
    ) -> Result<NodeHandle, ClientError> {
        let descriptor = self
            .inner
            .server
            .open(self.inner.session, path.into(), read_only, events)
            .await?;
        Ok(NodeHandle { inner: Arc::clone(&self.inner), descriptor })
    }

    /// End the session: stop the background tasks and tell the server.
    pub async fn close(self) -> Result<(), ClientError> {
        self.inner.shutdown.cancel();
        self.inner.server.close_session(self.inner.session).await
    }
}

/// A per-session handle to one node.
pub struct NodeHandle {
    inner: Arc<ClientInner>,
    descriptor: NodeDescriptor,
}

impl NodeHandle {
    pub fn path(&self) -> &NodePath {
        &self.descriptor.path
    }

    pub fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    /// Block until the exclusive lock is held. A lock already in the
    /// local set costs no RPC.
    pub async fn acquire(&self) -> Result<(), ClientError> {
        if self.inner.locks.contains(&self.descriptor) {
            return Ok(());
        }
        self.inner.server.acquire(self.descriptor.clone()).await?;
        self.inner.locks.add(self.descriptor.clone());
        Ok(())
    }

    pub async fn try_acquire(&self) -> Result<bool, ClientError> {
        if self.inner.locks.contains(&self.descriptor) {
            return Ok(true);
        }
        let acquired = self.inner.server.try_acquire(self.descriptor.clone()).await?;
        if acquired {
            self.inner.locks.add(self.descriptor.clone());
        }
        Ok(acquired)
    }

    pub async fn release(&self) -> Result<(), ClientError> {
        self.inner.server.release(self.descriptor.clone()).await?;
        self.inner.locks.remove(&self.descriptor);
        Ok(())
    }

    /// Read content and stat, served from the cache while it is warm.
    pub async fn get_content_and_stat(&self) -> Result<NodeContentAndStat, ClientError> {
        if let Some(cas) = self.inner.cache.get(&self.descriptor) {
            return Ok(cas);
        }
        self.inner.fetch_content(&self.descriptor).await
    }

    /// Read just the stat. Always goes to the server.
    pub async fn stat(&self) -> Result<NodeStat, ClientError> {
        self.inner.server.get_stat(self.descriptor.clone()).await
    }

    /// Generation-gated write. Returns false when the gate rejected it.
    ///
    /// The server's fan-out skips the writing descriptor, so the local
    /// cache entry is dropped here; the next read pulls the fresh value.
    pub async fn set_content(
        &self,
        content: Vec<u8>,
        min_generation: u64,
    ) -> Result<bool, ClientError> {
        let committed =
            self.inner.server.set_content(self.descriptor.clone(), content, min_generation).await?;
        if committed {
            self.inner.cache.remove(&self.descriptor);
        }
        Ok(committed)
    }

    /// Register a callback fired whenever this path's content changes.
    pub fn subscribe(&self, callback: SubscriberCallback) {
        self.inner.subscriptions.register(self.descriptor.path.clone(), callback);
    }

    /// Close the descriptor and forget its local state.
    pub async fn close(self) -> Result<(), ClientError> {
        self.inner.server.close_node(self.descriptor.clone()).await?;
        self.inner.cache.remove(&self.descriptor);
        self.inner.locks.remove(&self.descriptor);
        Ok(())
    }
}

/// The rolling KeepAlive task: build the lease from the lock set, carry
/// cached generations along, fold returned events into the caches, and
/// forward them to the subscriber. Transport failures back off and retry;
/// the loop never runs faster than [`MIN_KEEPALIVE_DELAY`].
async fn keep_alive_loop(inner: Arc<ClientInner>, events_tx: mpsc::UnboundedSender<Event>) {
    loop {
        if inner.shutdown.is_cancelled() {
            return;
        }
        let started = Instant::now();

        let lease = LeaseInfo {
            session: inner.session,
            locked_nodes: inner.locks.locked_nodes(),
        };
        let event_info = inner.cache.event_infos();

        let result = tokio::select! {
            result = inner.server.keep_alive(lease, event_info, inner.keep_alive_delay) => result,
            _ = inner.shutdown.cancelled() => return,
        };

        match result {
            Ok(events) => {
                for event in events {
                    inner.apply_event(&event);
                    if events_tx.send(event).is_err() {
                        return;
                    }
                }
            }
            Err(err) => {
                warn!(%err, "keep alive failed, backing off");
                tokio::select! {
                    _ = tokio::time::sleep(CONNECTION_ERROR_BACKOFF) => {}
                    _ = inner.shutdown.cancelled() => return,
                }
            }
        }

        let elapsed = started.elapsed();
        if elapsed < MIN_KEEPALIVE_DELAY {
            tokio::select! {
                _ = tokio::time::sleep(MIN_KEEPALIVE_DELAY - elapsed) => {}
                _ = inner.shutdown.cancelled() => return,
            }
        }
    }
}

/// Dispatch task: bare invalidations pull fresh content first, pushes
/// fire directly, lock invalidations were already folded into the lock
/// set by the KeepAlive loop.
async fn subscriber_loop(inner: Arc<ClientInner>, mut events: mpsc::UnboundedReceiver<Event>) {
    loop {
        let event = tokio::select! {
            event = events.recv() => match event {
                Some(event) => event,
                None => return,
            },
            _ = inner.shutdown.cancelled() => return,
        };

        match event {
            Event::ContentInvalidated { descriptor } => {
                match inner.fetch_content(&descriptor).await {
                    Ok(cas) => inner.subscriptions.dispatch(&descriptor.path, &cas),
                    Err(err) => {
                        warn!(%err, path = %descriptor.path, "pull after invalidation failed");
                    }
                }
            }
            Event::ContentPush { descriptor, cas } => {
                inner.subscriptions.dispatch(&descriptor.path, &cas);
            }
            Event::LockInvalidated { descriptor } => {
                debug!(path = %descriptor.path, "lock invalidation delivered");
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Abstract server surface and the TCP transport.
//!
//! Each RPC opens its own connection: calls never queue behind a parked
//! KeepAlive, and a dead replica costs one failed connect instead of a
//! wedged stream.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::BufStream;
use tokio::net::TcpStream;

use warden_core::{
    CoordError, Event, EventInfo, EventsConfig, LeaseInfo, NodeContentAndStat, NodeDescriptor,
    NodePath, NodeStat, SessionKey,
};
use warden_wire::{read_response, write_request, Request, Response};

use crate::error::ClientError;

/// Bound on one request/response exchange.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Acquire blocks server-side until the lock frees up, so it gets a far
/// looser deadline than the other calls.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(300);

/// The full RPC surface of one replica.
#[async_trait]
pub trait ServerApi: Send + Sync {
    async fn ping(&self) -> Result<(), ClientError>;

    async fn open_session(&self) -> Result<SessionKey, ClientError>;
    async fn close_session(&self, session: SessionKey) -> Result<(), ClientError>;

    async fn open(
        &self,
        session: SessionKey,
        path: NodePath,
        read_only: bool,
        events: EventsConfig,
    ) -> Result<NodeDescriptor, ClientError>;
    async fn close_node(&self, descriptor: NodeDescriptor) -> Result<(), ClientError>;

    async fn keep_alive(
        &self,
        lease: LeaseInfo,
        event_info: Vec<EventInfo>,
        max_delay: Duration,
    ) -> Result<Vec<Event>, ClientError>;

    async fn acquire(&self, descriptor: NodeDescriptor) -> Result<(), ClientError>;
    async fn try_acquire(&self, descriptor: NodeDescriptor) -> Result<bool, ClientError>;
    async fn release(&self, descriptor: NodeDescriptor) -> Result<(), ClientError>;

    async fn get_content_and_stat(
        &self,
        descriptor: NodeDescriptor,
    ) -> Result<NodeContentAndStat, ClientError>;
    async fn get_stat(&self, descriptor: NodeDescriptor) -> Result<NodeStat, ClientError>;
    async fn set_content(
        &self,
        descriptor: NodeDescriptor,
        content: Vec<u8>,
        min_generation: u64,
    ) -> Result<bool, ClientError>;
}

/// Connects to one replica address.
pub struct TcpTransport {
    addr: String,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn call(&self, request: Request, timeout: Duration) -> Result<Response, ClientError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(warden_wire::WireError::Io)?;
        let mut stream = BufStream::new(stream);

        write_request(&mut stream, &request, REQUEST_TIMEOUT).await?;
        let response = read_response(&mut stream, timeout).await?;

        if let Response::Error { message } = response {
            return match CoordError::from_wire_message(&message) {
                Some(err) => Err(ClientError::Coord(err)),
                None => Err(ClientError::Protocol(message)),
            };
        }
        Ok(response)
    }
}

fn unexpected(response: &Response) -> ClientError {
    ClientError::Protocol(format!("unexpected response {response:?}"))
}

#[async_trait]
impl ServerApi for TcpTransport {
    async fn ping(&self) -> Result<(), ClientError> {
        match self.call(Request::Ping, REQUEST_TIMEOUT).await? {
            Response::Pong => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    async fn open_session(&self) -> Result<SessionKey, ClientError> {
        match self.call(Request::OpenSession, REQUEST_TIMEOUT).await? {
            Response::Session { session } => Ok(session),
            other => Err(unexpected(&other)),
        }
    }

    async fn close_session(&self, session: SessionKey) -> Result<(), ClientError> {
        match self.call(Request::CloseSession { session }, REQUEST_TIMEOUT).await? {
            Response::Ok => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    async fn open(
        &self,
        session: SessionKey,
        path: NodePath,
        read_only: bool,
        events: EventsConfig,
    ) -> Result<NodeDescriptor, ClientError> {
        let request = Request::Open { session, path, read_only, events };
        match self.call(request, REQUEST_TIMEOUT).await? {
            Response::Node { descriptor } => Ok(descriptor),
            other => Err(unexpected(&other)),
        }
    }

    async fn close_node(&self, descriptor: NodeDescriptor) -> Result<(), ClientError> {
        match self.call(Request::CloseNode { descriptor }, REQUEST_TIMEOUT).await? {
            Response::Ok => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    async fn keep_alive(
        &self,
        lease: LeaseInfo,
        event_info: Vec<EventInfo>,
        max_delay: Duration,
    ) -> Result<Vec<Event>, ClientError> {
        let request = Request::KeepAlive {
            lease,
            event_info,
            max_delay_ms: max_delay.as_millis() as u64,
        };
        match self.call(request, REQUEST_TIMEOUT).await? {
            Response::Events { events } => Ok(events),
            other => Err(unexpected(&other)),
        }
    }

    async fn acquire(&self, descriptor: NodeDescriptor) -> Result<(), ClientError> {
        match self.call(Request::Acquire { descriptor }, ACQUIRE_TIMEOUT).await? {
            Response::Acquired { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    async fn try_acquire(&self, descriptor: NodeDescriptor) -> Result<bool, ClientError> {
        match self.call(Request::TryAcquire { descriptor }, REQUEST_TIMEOUT).await? {
            Response::Acquired { acquired } => Ok(acquired),
            other => Err(unexpected(&other)),
        }
    }

    async fn release(&self, descriptor: NodeDescriptor) -> Result<(), ClientError> {
        match self.call(Request::Release { descriptor }, REQUEST_TIMEOUT).await? {
            Response::Ok => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    async fn get_content_and_stat(
        &self,
        descriptor: NodeDescriptor,
    ) -> Result<NodeContentAndStat, ClientError> {
        match self.call(Request::GetContentAndStat { descriptor }, REQUEST_TIMEOUT).await? {
            Response::Content { cas } => Ok(cas),
            other => Err(unexpected(&other)),
        }
    }

    async fn get_stat(&self, descriptor: NodeDescriptor) -> Result<NodeStat, ClientError> {
        match self.call(Request::GetStat { descriptor }, REQUEST_TIMEOUT).await? {
            Response::Stat { stat } => Ok(stat),
            other => Err(unexpected(&other)),
        }
    }

    async fn set_content(
        &self,
        descriptor: NodeDescriptor,
        content: Vec<u8>,
        min_generation: u64,
    ) -> Result<bool, ClientError> {
        let request = Request::SetContent { descriptor, content, min_generation };
        match self.call(request, REQUEST_TIMEOUT).await? {
            Response::Set { committed } => Ok(committed),
            other => Err(unexpected(&other)),
        }
    }
}

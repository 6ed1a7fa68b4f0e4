// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP listener for client connections.
//!
//! Accepts connections and spawns a task per connection; each task loops
//! reading framed requests and writing framed responses until the peer
//! hangs up. Application failures become error responses on the wire,
//! never dropped connections.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use warden_core::CoordError;
use warden_wire::{read_request, write_response, Request, Response, WireError};

use crate::frontend::Frontend;

const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Listener {
    tcp: TcpListener,
    frontend: Arc<Frontend>,
    shutdown: CancellationToken,
}

impl Listener {
    pub fn new(tcp: TcpListener, frontend: Arc<Frontend>, shutdown: CancellationToken) -> Self {
        Self { tcp, frontend, shutdown }
    }

    /// Run the accept loop until shutdown.
    pub async fn run(self) {
        info!(addr = ?self.tcp.local_addr().ok(), "listener started");
        loop {
            let accepted = tokio::select! {
                accepted = self.tcp.accept() => accepted,
                _ = self.shutdown.cancelled() => {
                    debug!("listener shutting down");
                    return;
                }
            };
            match accepted {
                Ok((stream, addr)) => {
                    debug!(%addr, "connection accepted");
                    let frontend = Arc::clone(&self.frontend);
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, frontend).await {
                            log_connection_error(err);
                        }
                    });
                }
                Err(err) => error!(%err, "accept error"),
            }
        }
    }
}

fn log_connection_error(err: WireError) {
    match err {
        WireError::ConnectionClosed => debug!("client disconnected"),
        other => error!(err = %other, "connection error"),
    }
}

async fn handle_connection(stream: TcpStream, frontend: Arc<Frontend>) -> Result<(), WireError> {
    let (mut reader, mut writer) = stream.into_split();
    loop {
        let request = match read_request(&mut reader).await {
            Ok(request) => request,
            Err(WireError::ConnectionClosed) => return Ok(()),
            Err(err) => return Err(err),
        };

        debug!(request = ?request, "received request");
        let response = dispatch(&frontend, request).await;
        write_response(&mut writer, &response, WRITE_TIMEOUT).await?;
    }
}

fn error_response(err: CoordError) -> Response {
    Response::Error { message: err.wire_message() }
}

fn ok_or_error<T>(result: Result<T, CoordError>, ok: impl FnOnce(T) -> Response) -> Response {
    match result {
        Ok(value) => ok(value),
        Err(err) => error_response(err),
    }
}

async fn dispatch(frontend: &Frontend, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::OpenSession => ok_or_error(frontend.open_session().await, |session| {
            Response::Session { session }
        }),

        Request::CloseSession { session } => {
            ok_or_error(frontend.close_session(session).await, |_| Response::Ok)
        }

        Request::Open { session, path, read_only, events } => {
            ok_or_error(frontend.open(session, path, read_only, events).await, |descriptor| {
                Response::Node { descriptor }
            })
        }

        Request::CloseNode { descriptor } => {
            ok_or_error(frontend.close_node(&descriptor).await, |_| Response::Ok)
        }

        Request::KeepAlive { lease, event_info, max_delay_ms } => {
            let max_delay = Duration::from_millis(max_delay_ms);
            ok_or_error(frontend.keep_alive(lease, event_info, max_delay).await, |events| {
                Response::Events { events }
            })
        }

        Request::Acquire { descriptor } => {
            ok_or_error(frontend.acquire(&descriptor).await, |_| Response::Acquired {
                acquired: true,
            })
        }

        Request::TryAcquire { descriptor } => {
            ok_or_error(frontend.try_acquire(&descriptor).await, |acquired| Response::Acquired {
                acquired,
            })
        }

        Request::Release { descriptor } => {
            ok_or_error(frontend.release(&descriptor).await, |_| Response::Ok)
        }

        Request::GetContentAndStat { descriptor } => {
            ok_or_error(frontend.get_content_and_stat(&descriptor), |cas| Response::Content {
                cas,
            })
        }

        Request::GetStat { descriptor } => {
            ok_or_error(frontend.get_stat(&descriptor), |stat| Response::Stat { stat })
        }

        Request::SetContent { descriptor, content, min_generation } => ok_or_error(
            frontend.set_content(&descriptor, content, min_generation).await,
            |committed| Response::Set { committed },
        ),
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;

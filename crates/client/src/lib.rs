// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client runtime for the warden coordination service.
//!
//! Owns the session lifecycle: a rolling KeepAlive task proves liveness
//! and carries invalidation events home, a content cache stays warm until
//! an invalidation lands, the held-lock set rides on every KeepAlive, and
//! registered callbacks fire from a subscriber task. A redirect-following
//! transport hides leader failover from all of it.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod cache;
mod client;
mod error;
mod redirect;
mod subscriber;
mod transport;

pub use client::{Client, NodeHandle, CONNECTION_ERROR_BACKOFF, MIN_KEEPALIVE_DELAY};
pub use error::ClientError;
pub use redirect::RedirectClient;
pub use subscriber::SubscriberCallback;
pub use transport::{ServerApi, TcpTransport};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leader-redirect and jeopardy specs.

use std::time::Duration;

use warden_client::{Client, ClientError};
use warden_core::EventsConfig;
use warden_server::ClusterState;

use crate::support::{start_server, SPEC_KEEPALIVE_DELAY};

#[tokio::test]
async fn client_follows_redirect_to_the_leader() {
    // node 1 is a follower pointing at node 2; node 2 leads
    let follower = start_server(1).await;
    let leader = start_server(2).await;
    follower
        .cluster_tx
        .send(ClusterState::follower(2, leader.addr.clone()))
        .expect("steer follower");

    let addrs = vec![follower.addr.clone(), leader.addr.clone()];
    let client =
        Client::connect(&addrs, SPEC_KEEPALIVE_DELAY).await.expect("connect through redirect");

    // the whole session runs against the leader the redirect named
    let node = client.open("/a", false, EventsConfig::default()).await.expect("open");
    assert!(node.set_content(b"v".to_vec(), 16).await.expect("set"));
    assert_eq!(node.get_content_and_stat().await.expect("get").content, b"v");
}

#[tokio::test]
async fn unreachable_cluster_is_jeopardy() {
    // a bound-then-dropped listener leaves a port nobody answers on
    let port = {
        let probe = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        probe.local_addr().expect("local addr").port()
    };
    let addrs = vec![format!("127.0.0.1:{port}")];

    let result = Client::connect(&addrs, SPEC_KEEPALIVE_DELAY).await;
    match result {
        Err(ClientError::Jeopardy) => {}
        Err(ClientError::Transport(_)) => {}
        other => panic!("expected jeopardy or transport failure, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_failure_fails_over_to_surviving_replica() {
    let dead_port = {
        let probe = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        probe.local_addr().expect("local addr").port()
    };
    let survivor = start_server(2).await;

    // first address dead, second alive: the walk lands on the survivor
    let addrs = vec![format!("127.0.0.1:{dead_port}"), survivor.addr.clone()];
    let client = Client::connect(&addrs, SPEC_KEEPALIVE_DELAY).await.expect("connect");

    let node = client.open("/a", false, EventsConfig::default()).await.expect("open");
    assert!(node.set_content(b"v".to_vec(), 16).await.expect("set"));

    tokio::time::sleep(Duration::from_millis(300)).await;
    // keep-alives kept flowing to the survivor; the session is still valid
    assert_eq!(node.stat().await.expect("stat").generation, 1);
}

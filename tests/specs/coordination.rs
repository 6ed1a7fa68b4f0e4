// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core coordination specs: content versioning and lock exclusion over
//! the real wire.

use warden_client::ClientError;
use warden_core::{CoordError, EventsConfig};

use crate::support::{connect, start_server};

#[tokio::test]
async fn open_get_set_get() {
    let server = start_server(1).await;
    let client = connect(&[&server]).await;

    let node = client.open("/a", false, EventsConfig::default()).await.expect("open");

    let cas = node.get_content_and_stat().await.expect("get");
    assert!(cas.content.is_empty());
    assert_eq!(cas.stat.generation, 0);

    assert!(node.set_content(b"hi".to_vec(), 16).await.expect("set"));

    let cas = node.get_content_and_stat().await.expect("get");
    assert_eq!(cas.content, b"hi");
    assert_eq!(cas.stat.generation, 1);
}

#[tokio::test]
async fn generation_gating_rejects_stale_writers() {
    let server = start_server(1).await;
    let client = connect(&[&server]).await;
    let node = client.open("/a", false, EventsConfig::default()).await.expect("open");

    assert!(node.set_content(b"hi".to_vec(), 16).await.expect("set"));
    assert!(!node.set_content(b"x".to_vec(), 0).await.expect("set"));
    assert_eq!(node.stat().await.expect("stat").generation, 1);

    assert!(node.set_content(b"y".to_vec(), 1).await.expect("set"));
    assert_eq!(node.stat().await.expect("stat").generation, 2);
}

#[tokio::test]
async fn locks_exclude_across_sessions() {
    let server = start_server(1).await;
    let first = connect(&[&server]).await;
    let second = connect(&[&server]).await;

    let node1 = first.open("/k", false, EventsConfig::default()).await.expect("open");
    let node2 = second.open("/k", false, EventsConfig::default()).await.expect("open");

    assert!(node1.try_acquire().await.expect("try acquire"));
    assert!(!node2.try_acquire().await.expect("try acquire"));

    node1.release().await.expect("release");
    assert!(node2.try_acquire().await.expect("try acquire"));
}

#[tokio::test]
async fn releasing_someone_elses_lock_fails() {
    let server = start_server(1).await;
    let first = connect(&[&server]).await;
    let second = connect(&[&server]).await;

    let node1 = first.open("/k", false, EventsConfig::default()).await.expect("open");
    let node2 = second.open("/k", false, EventsConfig::default()).await.expect("open");

    assert!(node1.try_acquire().await.expect("try acquire"));

    let result = node2.release().await;
    assert!(
        matches!(result, Err(ClientError::Coord(CoordError::LockNotHeld))),
        "got {result:?}"
    );
}

#[tokio::test]
async fn read_only_descriptors_cannot_write_or_lock() {
    let server = start_server(1).await;
    let client = connect(&[&server]).await;
    let node = client.open("/r", true, EventsConfig::default()).await.expect("open");

    let result = node.set_content(b"x".to_vec(), 0).await;
    assert!(
        matches!(result, Err(ClientError::Coord(CoordError::ReadOnlyDescriptor))),
        "got {result:?}"
    );

    let result = node.acquire().await;
    assert!(
        matches!(result, Err(ClientError::Coord(CoordError::ReadOnlyDescriptor))),
        "got {result:?}"
    );

    // reading still works
    assert_eq!(node.get_content_and_stat().await.expect("get").stat.generation, 0);
}

#[tokio::test]
async fn blocking_acquire_wins_after_release() {
    let server = start_server(1).await;
    let first = connect(&[&server]).await;
    let second = connect(&[&server]).await;

    let node1 = first.open("/k", false, EventsConfig::default()).await.expect("open");
    let node2 = second.open("/k", false, EventsConfig::default()).await.expect("open");

    assert!(node1.try_acquire().await.expect("try acquire"));

    let contender = tokio::spawn(async move {
        node2.acquire().await.expect("acquire");
        node2
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!contender.is_finished());

    node1.release().await.expect("release");
    let node2 = tokio::time::timeout(std::time::Duration::from_secs(5), contender)
        .await
        .expect("acquire never completed")
        .expect("contender panicked");

    // and the lock is genuinely held now
    assert!(!node1.try_acquire().await.expect("try acquire"));
    node2.release().await.expect("release");
}

#[tokio::test]
async fn closed_session_invalidates_descriptors() {
    let server = start_server(1).await;
    let client = connect(&[&server]).await;
    let survivor = connect(&[&server]).await;

    let node = client.open("/k", false, EventsConfig::default()).await.expect("open");
    assert!(node.try_acquire().await.expect("try acquire"));

    client.close().await.expect("close session");

    // the closed session's lock fell with it
    let node2 = survivor.open("/k", false, EventsConfig::default()).await.expect("open");
    assert!(node2.try_acquire().await.expect("try acquire"));
}

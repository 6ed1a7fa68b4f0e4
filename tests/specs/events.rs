// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invalidation delivery specs: push and pull subscribers, event order,
//! and lock loss on session death.

use std::sync::Arc;

use parking_lot::Mutex;
use warden_core::EventsConfig;

use crate::support::{connect, start_server, wait_for};

#[tokio::test]
async fn push_subscriber_sees_written_content() {
    let server = start_server(1).await;
    let subscriber = connect(&[&server]).await;
    let writer = connect(&[&server]).await;

    let watched = subscriber.open("/p", false, EventsConfig::push()).await.expect("open");
    let seen: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    watched.subscribe(Arc::new(move |_, cas| sink.lock().push(cas.content.clone())));

    let node = writer.open("/p", false, EventsConfig::default()).await.expect("open");
    assert!(node.set_content(b"hello".to_vec(), 16).await.expect("set"));

    assert!(wait_for(|| !seen.lock().is_empty()).await, "push never arrived");
    assert_eq!(seen.lock().first(), Some(&b"hello".to_vec()));

    // the pushed value warmed the subscriber's cache
    let cas = watched.get_content_and_stat().await.expect("get");
    assert_eq!(cas.content, b"hello");
    assert_eq!(cas.stat.generation, 1);
}

#[tokio::test]
async fn pull_subscriber_fetches_after_invalidation() {
    let server = start_server(1).await;
    let subscriber = connect(&[&server]).await;
    let writer = connect(&[&server]).await;

    let watched = subscriber.open("/p", false, EventsConfig::default()).await.expect("open");
    let seen: Arc<Mutex<Vec<(u64, Vec<u8>)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    watched.subscribe(Arc::new(move |_, cas| {
        sink.lock().push((cas.stat.generation, cas.content.clone()));
    }));

    let node = writer.open("/p", false, EventsConfig::default()).await.expect("open");
    assert!(node.set_content(b"fresh".to_vec(), 16).await.expect("set"));

    assert!(wait_for(|| !seen.lock().is_empty()).await, "invalidation never arrived");
    assert_eq!(seen.lock().first(), Some(&(1, b"fresh".to_vec())));
}

#[tokio::test]
async fn sequential_writes_arrive_in_order() {
    let server = start_server(1).await;
    let subscriber = connect(&[&server]).await;
    let writer = connect(&[&server]).await;

    let watched = subscriber.open("/p", false, EventsConfig::push()).await.expect("open");
    let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    watched.subscribe(Arc::new(move |_, cas| sink.lock().push(cas.stat.generation)));

    let node = writer.open("/p", false, EventsConfig::default()).await.expect("open");
    for round in 0u8..3 {
        assert!(node.set_content(vec![round], u64::from(round)).await.expect("set"));
    }

    assert!(wait_for(|| seen.lock().len() >= 3).await, "events missing");
    assert_eq!(*seen.lock(), vec![1, 2, 3]);
}

#[tokio::test]
async fn observed_generations_never_regress() {
    let server = start_server(1).await;
    let subscriber = connect(&[&server]).await;
    let writer = connect(&[&server]).await;

    let watched = subscriber.open("/g", false, EventsConfig::push()).await.expect("open");
    let regressions: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
    let last_seen: Arc<Mutex<u64>> = Arc::new(Mutex::new(0));
    let count: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));

    let bad = Arc::clone(&regressions);
    let last = Arc::clone(&last_seen);
    let total = Arc::clone(&count);
    watched.subscribe(Arc::new(move |_, cas| {
        let mut last = last.lock();
        if cas.stat.generation <= *last {
            *bad.lock() += 1;
        }
        *last = cas.stat.generation;
        *total.lock() += 1;
    }));

    let node = writer.open("/g", false, EventsConfig::default()).await.expect("open");
    for round in 0u8..5 {
        assert!(
            node.set_content(vec![round], warden_core::ANY_GENERATION).await.expect("set")
        );
    }

    assert!(wait_for(|| *count.lock() >= 5).await, "pushes missing");
    assert_eq!(*regressions.lock(), 0, "a pushed generation regressed");
}

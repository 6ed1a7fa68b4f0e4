// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex;
use warden_core::NodeStat;

fn cas(content: &[u8]) -> NodeContentAndStat {
    NodeContentAndStat {
        content: content.to_vec(),
        stat: NodeStat { generation: 1, last_modified_ms: 0 },
    }
}

#[test]
fn dispatch_routes_by_path() {
    let subs = Subscriptions::default();
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    subs.register(
        "/watched".into(),
        Arc::new(move |path, cas| {
            sink.lock().push(format!("{path}={}", String::from_utf8_lossy(&cas.content)));
        }),
    );

    subs.dispatch(&"/watched".into(), &cas(b"v1"));
    subs.dispatch(&"/other".into(), &cas(b"ignored"));

    assert_eq!(*seen.lock(), vec!["/watched=v1"]);
}

#[test]
fn panicking_callback_does_not_poison_dispatch() {
    let subs = Subscriptions::default();
    let seen: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));

    subs.register("/bad".into(), Arc::new(|_, _| panic!("callback bug")));
    let sink = Arc::clone(&seen);
    subs.register(
        "/good".into(),
        Arc::new(move |_, _| {
            *sink.lock() += 1;
        }),
    );

    subs.dispatch(&"/bad".into(), &cas(b"x"));
    subs.dispatch(&"/good".into(), &cas(b"y"));

    assert_eq!(*seen.lock(), 1);
}

#[test]
fn re_register_replaces_the_callback() {
    let subs = Subscriptions::default();
    let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let first = Arc::clone(&seen);
    subs.register("/p".into(), Arc::new(move |_, _| first.lock().push("first")));
    let second = Arc::clone(&seen);
    subs.register("/p".into(), Arc::new(move |_, _| second.lock().push("second")));

    subs.dispatch(&"/p".into(), &cas(b"v"));
    assert_eq!(*seen.lock(), vec!["second"]);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn nd(session: u64, descriptor: u64, path: &str) -> NodeDescriptor {
    NodeDescriptor::new(SessionKey(session), DescriptorKey(descriptor), path.into())
}

#[test]
fn descriptors_hash_by_value() {
    let mut set = std::collections::HashSet::new();
    assert!(set.insert(nd(1, 1, "/a")));
    assert!(!set.insert(nd(1, 1, "/a")));
    assert!(set.insert(nd(1, 2, "/a")));
    assert!(set.insert(nd(2, 1, "/a")));
}

#[test]
fn keys_serialize_transparently() {
    let json = serde_json::to_string(&SessionKey(42)).unwrap();
    assert_eq!(json, "42");
    let back: SessionKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, SessionKey(42));
}

#[test]
fn display_is_compact() {
    assert_eq!(nd(3, 9, "/k").to_string(), "s3/d9:/k");
}

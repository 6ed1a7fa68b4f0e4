// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_core::{DescriptorKey, NodeStat, SessionKey};

fn nd(descriptor: u64, path: &str) -> NodeDescriptor {
    NodeDescriptor::new(SessionKey(1), DescriptorKey(descriptor), path.into())
}

fn cas(generation: u64) -> NodeContentAndStat {
    NodeContentAndStat {
        content: b"v".to_vec(),
        stat: NodeStat { generation, last_modified_ms: 0 },
    }
}

#[test]
fn cache_put_get_remove() {
    let cache = NodeCache::default();
    let key = nd(1, "/a");

    assert!(cache.get(&key).is_none());
    cache.put(key.clone(), cas(3));
    assert_eq!(cache.get(&key).map(|c| c.stat.generation), Some(3));

    cache.remove(&key);
    assert!(cache.get(&key).is_none());
}

#[test]
fn event_infos_reflect_cached_generations() {
    let cache = NodeCache::default();
    cache.put(nd(1, "/a"), cas(3));
    cache.put(nd(2, "/b"), cas(7));

    let mut generations: Vec<u64> =
        cache.event_infos().into_iter().map(|info| info.generation).collect();
    generations.sort_unstable();
    assert_eq!(generations, vec![3, 7]);
    assert!(cache.event_infos().iter().all(|info| info.push));
}

#[test]
fn lock_set_tracks_membership() {
    let locks = LockSet::default();
    let key = nd(1, "/k");

    assert!(!locks.contains(&key));
    locks.add(key.clone());
    assert!(locks.contains(&key));
    assert_eq!(locks.locked_nodes(), vec![key.clone()]);

    locks.remove(&key);
    assert!(!locks.contains(&key));
    assert!(locks.locked_nodes().is_empty());
}

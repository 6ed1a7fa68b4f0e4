// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_core::DescriptorKey;
use yare::parameterized;

fn nd(path: &str) -> NodeDescriptor {
    NodeDescriptor::new(SessionKey(2), DescriptorKey(5), path.into())
}

#[parameterized(
    open_session = { Command::OpenSession { id: 1 } },
    close_session = { Command::CloseSession { id: 2, session: SessionKey(3) } },
    open_node = { Command::OpenNode {
        id: 3,
        session: SessionKey(3),
        path: "/a".into(),
        read_only: true,
        events: EventsConfig::push(),
    } },
    close_node = { Command::CloseNode { id: 4, descriptor: nd("/a") } },
    set_locked = { Command::SetLocked { id: 5, descriptor: nd("/k") } },
    release = { Command::ReleaseLock { id: 6, descriptor: nd("/k") } },
    prepare = { Command::PrepareSet {
        id: 7,
        descriptor: nd("/p"),
        content: b"data".to_vec(),
        min_generation: 9,
        modified_ms: 1234,
    } },
    finalize = { Command::FinalizeSet { id: 8, path: "/p".into() } },
)]
fn commands_roundtrip(command: Command) {
    let bytes = command.encode().expect("encode failed");
    let back = Command::decode(&bytes).expect("decode failed");
    assert_eq!(back, command);
    assert_eq!(back.id(), command.id());
}

#[test]
fn garbage_entry_fails_decode() {
    assert!(Command::decode(b"\xffnot-a-command").is_err());
}

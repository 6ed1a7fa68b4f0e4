// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_core::{CoordError, LeaderHint, NodeStat};
use yare::parameterized;

#[test]
fn redirect_error_parses_back_to_hint() {
    let err = CoordError::Redirect(LeaderHint { leader_id: 3, leader_addr: "n3:7700".into() });
    let response = Response::Error { message: err.wire_message() };

    let bytes = crate::encode(&response).expect("encode failed");
    let back: Response = crate::decode(&bytes).expect("decode failed");

    let Response::Error { message } = back else {
        panic!("expected error response");
    };
    assert_eq!(CoordError::from_wire_message(&message), Some(err));
}

#[parameterized(
    ok = { Response::Ok },
    pong = { Response::Pong },
    session = { Response::Session { session: SessionKey(9) } },
    acquired = { Response::Acquired { acquired: true } },
    set_rejected = { Response::Set { committed: false } },
    stat = { Response::Stat { stat: NodeStat { generation: 8, last_modified_ms: 123 } } },
    empty_events = { Response::Events { events: Vec::new() } },
)]
fn responses_roundtrip(response: Response) {
    let bytes = crate::encode(&response).expect("encode failed");
    let back: Response = crate::decode(&bytes).expect("decode failed");
    assert_eq!(back, response);
}

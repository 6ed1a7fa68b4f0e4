// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format tests: length-prefix framing and MessagePack encoding.

use super::*;
use std::time::Duration;
use warden_core::{
    DescriptorKey, Event, NodeContentAndStat, NodeDescriptor, NodeStat, SessionKey,
};

fn nd(path: &str) -> NodeDescriptor {
    NodeDescriptor::new(SessionKey(1), DescriptorKey(1), path.into())
}

#[tokio::test]
async fn frame_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_frame(&mut buffer, original).await.expect("write failed");

    // 4-byte length prefix plus payload
    assert_eq!(buffer.len(), 4 + original.len());
    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_frame(&mut cursor).await.expect("read failed");
    assert_eq!(read_back, original);
}

#[tokio::test]
async fn closed_stream_reports_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
    match read_frame(&mut cursor).await {
        Err(WireError::ConnectionClosed) => {}
        other => panic!("expected ConnectionClosed, got {other:?}"),
    }
}

#[tokio::test]
async fn oversized_length_prefix_rejected() {
    let bogus = ((MAX_FRAME_LEN + 1) as u32).to_be_bytes().to_vec();
    let mut cursor = std::io::Cursor::new(bogus);
    match read_frame(&mut cursor).await {
        Err(WireError::FrameTooLarge(len)) => assert_eq!(len, MAX_FRAME_LEN + 1),
        other => panic!("expected FrameTooLarge, got {other:?}"),
    }
}

#[test]
fn event_union_roundtrips_through_codec() {
    let events = vec![
        Event::LockInvalidated { descriptor: nd("/locks/a") },
        Event::ContentInvalidated { descriptor: nd("/cfg") },
        Event::ContentPush {
            descriptor: nd("/cfg"),
            cas: NodeContentAndStat {
                content: b"v2".to_vec(),
                stat: NodeStat { generation: 2, last_modified_ms: 17 },
            },
        },
    ];
    let response = Response::Events { events };

    let bytes = encode(&response).expect("encode failed");
    let back: Response = decode(&bytes).expect("decode failed");
    assert_eq!(back, response);
}

#[tokio::test]
async fn typed_request_roundtrip() {
    let request = Request::SetContent {
        descriptor: nd("/data"),
        content: b"payload".to_vec(),
        min_generation: 4,
    };

    let mut buffer = Vec::new();
    write_request(&mut buffer, &request, Duration::from_secs(1)).await.expect("write failed");

    let mut cursor = std::io::Cursor::new(buffer);
    let back = read_request(&mut cursor).await.expect("read failed");
    assert_eq!(back, request);
}

#[tokio::test]
async fn typed_response_roundtrip() {
    let response = Response::Error { message: "no leader".to_string() };

    let mut buffer = Vec::new();
    write_response(&mut buffer, &response, Duration::from_secs(1)).await.expect("write failed");

    let mut cursor = std::io::Cursor::new(buffer);
    let back = read_response(&mut cursor, Duration::from_secs(1)).await.expect("read failed");
    assert_eq!(back, response);
}

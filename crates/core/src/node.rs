// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node content and stat snapshots.

use serde::{Deserialize, Serialize};

/// Generation sentinel that always passes the write gate.
///
/// `SetContent` succeeds when `min_generation >= current`, so `u64::MAX`
/// means "unconditional write".
pub const ANY_GENERATION: u64 = u64::MAX;

/// Version metadata for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStat {
    /// Monotonically nondecreasing per path; a successful write raises it
    /// by exactly one.
    pub generation: u64,
    /// Wall-clock stamp in epoch milliseconds, produced by the proposer.
    pub last_modified_ms: u64,
}

/// Content plus stat, read in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeContentAndStat {
    #[serde(with = "serde_bytes_compat")]
    pub content: Vec<u8>,
    pub stat: NodeStat,
}

/// Byte-array content codec.
///
/// MessagePack has a native bin type; serde's default Vec<u8> handling
/// writes an element-wise array. Route through the serializer's byte hooks
/// so content frames stay compact.
mod serde_bytes_compat {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = Vec<u8>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("byte array")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Vec<u8>, E> {
                Ok(v.to_vec())
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Vec<u8>, E> {
                Ok(v)
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<u8>, A::Error> {
                let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(byte) = seq.next_element::<u8>()? {
                    out.push(byte);
                }
                Ok(out)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Vec<u8>, E> {
                Ok(v.as_bytes().to_vec())
            }
        }

        de.deserialize_byte_buf(BytesVisitor)
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;

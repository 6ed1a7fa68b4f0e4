// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framing and payload codec.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Request, Response};

/// Upper bound on one frame. Node content is small by design; anything
/// bigger than this is a corrupt or hostile length prefix.
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

/// Errors from framing and encoding.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("frame of {0} bytes exceeds limit")]
    FrameTooLarge(usize),

    #[error("encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wire timeout")]
    Timeout,
}

/// Encode a payload without the length prefix.
///
/// Named-field encoding keeps the payload self-describing, which the
/// tagged enums require.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    Ok(rmp_serde::encode::to_vec_named(value)?)
}

/// Decode a payload produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(rmp_serde::decode::from_slice(bytes)?)
}

fn map_eof(err: std::io::Error) -> WireError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        WireError::ConnectionClosed
    } else {
        WireError::Io(err)
    }
}

/// Write one length-prefixed frame.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(payload.len()));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame. Blocks until a frame arrives or the
/// peer goes away.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(map_eof)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(map_eof)?;
    Ok(payload)
}

/// Read the next request. No timeout: a session connection legitimately
/// sits idle between calls.
pub async fn read_request<R>(reader: &mut R) -> Result<Request, WireError>
where
    R: AsyncRead + Unpin,
{
    decode(&read_frame(reader).await?)
}

/// Write a request, bounded by `timeout`.
pub async fn write_request<W>(
    writer: &mut W,
    request: &Request,
    timeout: Duration,
) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let payload = encode(request)?;
    tokio::time::timeout(timeout, write_frame(writer, &payload))
        .await
        .map_err(|_| WireError::Timeout)?
}

/// Read a response, bounded by `timeout`.
pub async fn read_response<R>(reader: &mut R, timeout: Duration) -> Result<Response, WireError>
where
    R: AsyncRead + Unpin,
{
    let payload =
        tokio::time::timeout(timeout, read_frame(reader)).await.map_err(|_| WireError::Timeout)??;
    decode(&payload)
}

/// Write a response, bounded by `timeout`.
pub async fn write_response<W>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let payload = encode(response)?;
    tokio::time::timeout(timeout, write_frame(writer, &payload))
        .await
        .map_err(|_| WireError::Timeout)?
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;

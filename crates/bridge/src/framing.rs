//! Length-prefixed message framing (capture host ↔ browser extension).
//!
//! Wire format: a 4-byte little-endian length header, then that many bytes
//! of UTF-8 JSON. The reader blocks until the full header and body arrive.
//! A length of zero or above the cap is a protocol fault, not a recoverable
//! message.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::BridgeError;

/// Upper bound on a single framed message.
pub const MAX_MESSAGE_BYTES: u32 = 10 * 1024 * 1024;

/// Reads one framed JSON message.
pub async fn read_message<R, T>(reader: &mut R) -> Result<T, BridgeError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut header = [0u8; 4];
    reader.read_exact(&mut header).await?;
    let length = u32::from_le_bytes(header);

    if length == 0 || length > MAX_MESSAGE_BYTES {
        return Err(BridgeError::InvalidLength(length as u64));
    }

    let mut body = vec![0u8; length as usize];
    reader.read_exact(&mut body).await?;

    serde_json::from_slice(&body).map_err(|e| BridgeError::InvalidJson(e.to_string()))
}

/// Writes one framed JSON message. Nothing but protocol bytes may reach the
/// writer; diagnostics belong in the side log.
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), BridgeError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(message).map_err(|e| BridgeError::InvalidJson(e.to_string()))?;
    let header = (body.len() as u32).to_le_bytes();

    writer.write_all(&header).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

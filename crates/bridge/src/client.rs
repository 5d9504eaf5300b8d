//! The capture host's side of the control channel.
//!
//! Connects fresh per request, writes one JSON line, waits for exactly one
//! reply line, then closes. Every failure maps onto the bridge taxonomy so
//! the extension gets a legible reason instead of an error code.

use std::time::Duration;

use memex_core::types::{CaptureRequest, CaptureResponse};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::BridgeError;

#[derive(Debug, Clone, Copy)]
pub struct BridgeClientConfig {
    pub port: u16,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
}

impl Default for BridgeClientConfig {
    fn default() -> Self {
        Self {
            port: crate::DEFAULT_BRIDGE_PORT,
            connect_timeout: Duration::from_millis(700),
            response_timeout: Duration::from_secs(15),
        }
    }
}

/// Forwards one request to the application and returns its reply.
pub async fn forward_to_app(
    request: &CaptureRequest,
    config: &BridgeClientConfig,
) -> Result<CaptureResponse, BridgeError> {
    let connect = TcpStream::connect(("127.0.0.1", config.port));
    let stream = match tokio::time::timeout(config.connect_timeout, connect).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(BridgeError::AppNotRunning(e.to_string())),
        Err(_) => return Err(BridgeError::ConnectTimeout),
    };

    let (read_half, mut write_half) = stream.into_split();

    let mut payload =
        serde_json::to_vec(request).map_err(|e| BridgeError::InvalidJson(e.to_string()))?;
    payload.push(b'\n');
    write_half.write_all(&payload).await?;
    write_half.flush().await?;
    debug!(id = %request.id, "request forwarded");

    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    let read = match tokio::time::timeout(config.response_timeout, reader.read_line(&mut line))
        .await
    {
        Ok(Ok(read)) => read,
        Ok(Err(e)) => return Err(BridgeError::Io(e)),
        Err(_) => return Err(BridgeError::ResponseTimeout),
    };

    if read == 0 {
        return Err(BridgeError::PeerClosed);
    }

    serde_json::from_str(line.trim()).map_err(|e| BridgeError::InvalidResponse(e.to_string()))
}

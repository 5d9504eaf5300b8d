//! The local control channel: a TCP loopback listener speaking
//! newline-delimited JSON (one object per line, no length prefix).
//!
//! Each connection's requests are processed strictly sequentially; different
//! connections are independent. Protocol faults terminate only the offending
//! message or connection, never the process.

use std::sync::Arc;

use async_trait::async_trait;
use memex_core::types::{CaptureRequest, CaptureResponse};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

/// A single buffered line may not exceed this.
pub const MAX_REQUEST_BYTES: usize = 12 * 1024 * 1024;

/// Application-side request handler plugged into the listener.
#[async_trait]
pub trait CaptureHandler: Send + Sync {
    async fn handle(&self, req: CaptureRequest) -> CaptureResponse;
}

/// Binds the loopback listener and serves until the task is dropped.
pub async fn run_server(port: u16, handler: Arc<dyn CaptureHandler>) -> std::io::Result<()> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    info!(port, "control channel listening");
    serve(listener, handler).await
}

/// Serves on an already-bound listener (tests bind port 0 and use this).
pub async fn serve(listener: TcpListener, handler: Arc<dyn CaptureHandler>) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        let handler = handler.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, handler).await {
                warn!(peer = %peer, error = %e, "connection ended with error");
            }
        });
    }
}

async fn handle_connection(
    socket: TcpStream,
    handler: Arc<dyn CaptureHandler>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = Vec::new();

    loop {
        line.clear();
        // Bound the buffered bytes: read through a limited view so a peer
        // that never sends a newline cannot grow the buffer past the cap.
        let mut limited = (&mut reader).take(MAX_REQUEST_BYTES as u64 + 1);
        let read = limited.read_until(b'\n', &mut line).await?;
        if read == 0 {
            return Ok(());
        }
        let terminated = line.last() == Some(&b'\n');
        if line.len() > MAX_REQUEST_BYTES || (!terminated && read as u64 == MAX_REQUEST_BYTES as u64 + 1)
        {
            let reply = CaptureResponse::failure("unknown", "message_too_large");
            write_response(&mut write_half, &reply).await?;
            return Ok(());
        }
        if !terminated {
            // EOF in the middle of a line; nothing valid to answer.
            return Ok(());
        }

        let raw = String::from_utf8_lossy(&line);
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let request = match parse_request(raw) {
            Ok(request) => request,
            Err(id) => {
                write_response(&mut write_half, &CaptureResponse::failure(id, "invalid_request"))
                    .await?;
                continue;
            }
        };

        let id = request.id.clone();
        let response = handler.handle(request).await;
        if let Err(e) = write_response(&mut write_half, &response).await {
            warn!(id = %id, error = %e, "failed to write response");
            return Err(e);
        }
    }
}

/// Parses one request line. On failure returns whatever id could be
/// recovered, for the `invalid_request` reply.
fn parse_request(raw: &str) -> Result<CaptureRequest, String> {
    let value: Value = serde_json::from_str(raw).map_err(|_| "unknown".to_string())?;
    let Some(id) = value.get("id").and_then(|v| v.as_str()).map(str::to_string) else {
        return Err("unknown".to_string());
    };
    if id.is_empty() {
        return Err("unknown".to_string());
    }
    serde_json::from_value(value).map_err(|_| id)
}

async fn write_response<W>(writer: &mut W, response: &CaptureResponse) -> std::io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    let mut payload = serde_json::to_vec(response).unwrap_or_else(|_| {
        // Serialization of our own response type cannot realistically fail;
        // fall back to a bare error object if it somehow does.
        br#"{"id":"unknown","ok":false,"reason":"internal_error"}"#.to_vec()
    });
    payload.push(b'\n');
    writer.write_all(&payload).await?;
    writer.flush().await
}

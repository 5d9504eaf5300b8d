//! Capture host main loop.
//!
//! Reads length-prefixed requests from stdin, validates them, forwards them
//! to the application over the control channel, and writes length-prefixed
//! responses to stdout. stdout carries protocol bytes exclusively (the peer
//! treats any stray byte as protocol data), so every diagnostic goes to the
//! side log.
//!
//! A corrupted stdin stream is fatal: the process exits non-zero
//! and the OS-level host relaunches it.

use memex_core::text::to_single_line;
use memex_core::types::{CaptureRequest, CaptureResponse};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::client::{forward_to_app, BridgeClientConfig};
use crate::framing::{read_message, write_message};
use crate::validator::{validate_payload, validate_shape, PayloadLimits};
use crate::BridgeError;

const MAX_EXCERPT_CHARS: usize = 1000;

/// Outcome of one loop iteration.
pub enum HostStep {
    /// Message handled (successfully or with an error reply); keep looping.
    Continue,
    /// stdin is corrupt or closed; the process must exit.
    Fatal(BridgeError),
}

/// Runs the host until stdin dies. Returns the fatal error for the exit path.
pub async fn run_host<R, W>(
    stdin: &mut R,
    stdout: &mut W,
    client_config: &BridgeClientConfig,
    limits: &PayloadLimits,
) -> BridgeError
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("capture host started");
    loop {
        match handle_one(stdin, stdout, client_config, limits).await {
            HostStep::Continue => {}
            HostStep::Fatal(e) => {
                warn!(error = %e, "fatal read error, exiting");
                // Best effort: tell the extension the read failed before dying.
                let reply = CaptureResponse::failure("unknown", "read_failed");
                let _ = write_message(stdout, &reply).await;
                return e;
            }
        }
    }
}

/// Reads, validates, forwards and answers one message.
pub async fn handle_one<R, W>(
    stdin: &mut R,
    stdout: &mut W,
    client_config: &BridgeClientConfig,
    limits: &PayloadLimits,
) -> HostStep
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request: CaptureRequest = match read_message(stdin).await {
        Ok(request) => request,
        // Malformed JSON inside a well-framed message is recoverable; a bad
        // frame or dead pipe is not.
        Err(BridgeError::InvalidJson(e)) => {
            warn!(error = %e, "malformed request JSON");
            let reply = CaptureResponse::failure("unknown", "invalid_request");
            if write_message(stdout, &reply).await.is_err() {
                return HostStep::Fatal(BridgeError::InvalidJson(e));
            }
            return HostStep::Continue;
        }
        Err(e) => return HostStep::Fatal(e),
    };

    if let Err(reason) = validate_shape(&request) {
        warn!(id = %request.id, reason = %reason, "request failed shape validation");
        let reply = CaptureResponse::failure(&request.id, reason);
        return write_or_fatal(stdout, &reply).await;
    }

    // Size caps run locally, before the network hop.
    if let Err(reason) = validate_payload(&request, limits) {
        warn!(id = %request.id, reason = %reason, "payload over limits, rejected locally");
        let reply = CaptureResponse::failure(&request.id, reason);
        return write_or_fatal(stdout, &reply).await;
    }

    info!(
        id = %request.id,
        url = %request.url.as_deref().unwrap_or("").chars().take(200).collect::<String>(),
        "forwarding request"
    );

    let reply = match forward_to_app(&request, client_config).await {
        Ok(mut response) => {
            response.id = request.id.clone();
            if let Some(processed) = response.processed.as_mut() {
                if let Some(content) = processed.content.take() {
                    processed.content = Some(to_single_line(&content));
                }
                if let Some(excerpt) = processed.excerpt.take() {
                    let single = to_single_line(&excerpt);
                    processed.excerpt = Some(single.chars().take(MAX_EXCERPT_CHARS).collect());
                }
            }
            response
        }
        Err(e) => {
            warn!(id = %request.id, error = %e, "bridge error");
            CaptureResponse::failure(&request.id, e.to_string())
        }
    };

    info!(id = %reply.id, ok = reply.ok, "responding");
    write_or_fatal(stdout, &reply).await
}

async fn write_or_fatal<W>(stdout: &mut W, reply: &CaptureResponse) -> HostStep
where
    W: AsyncWrite + Unpin,
{
    match write_message(stdout, reply).await {
        Ok(()) => HostStep::Continue,
        Err(e) => HostStep::Fatal(e),
    }
}

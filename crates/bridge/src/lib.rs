//! # Native Bridge
//!
//! Plumbing between the out-of-process content-capture host and the main
//! application:
//!
//! - [`framing`] - 4-byte little-endian length-prefixed JSON over
//!   stdin/stdout (capture host ↔ browser extension)
//! - [`server`] - newline-delimited JSON over a TCP loopback socket
//!   (capture host ↔ application), one request per line, sequential per
//!   connection
//! - [`client`] - the capture host's fresh-connection-per-request side of
//!   that socket, with the bridge failure taxonomy
//! - [`validator`] - payload caps enforced before anything crosses the
//!   network hop
//! - [`host`] - the capture host main loop (ships as the
//!   `memex-capture-host` binary)

use thiserror::Error;

pub mod client;
pub mod framing;
pub mod host;
pub mod server;
pub mod validator;

/// Default TCP loopback port for the local control channel.
pub const DEFAULT_BRIDGE_PORT: u16 = 12346;

/// Env var overriding the control channel port.
pub const BRIDGE_PORT_ENV: &str = "MEMEX_BRIDGE_PORT";

/// Reads the bridge port from the environment, falling back to the default.
pub fn bridge_port() -> u16 {
    std::env::var(BRIDGE_PORT_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(DEFAULT_BRIDGE_PORT)
}

/// Bridge failure taxonomy. The `Display` form is the user-legible reason
/// string relayed back to the capture process's caller.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// TCP connect failed outright: the application is not listening.
    #[error("app_not_running: {0}")]
    AppNotRunning(String),

    /// TCP connect did not complete within the connect timeout.
    #[error("connect_timeout")]
    ConnectTimeout,

    /// The application accepted the request but never replied in time.
    #[error("app_response_timeout")]
    ResponseTimeout,

    /// The application's reply line was not valid JSON.
    #[error("invalid_app_response: {0}")]
    InvalidResponse(String),

    /// The application closed the connection before replying.
    #[error("app_closed")]
    PeerClosed,

    /// Length prefix outside (0, max]; a protocol fault.
    #[error("invalid message length: {0}")]
    InvalidLength(u64),

    /// Frame body was not valid JSON.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

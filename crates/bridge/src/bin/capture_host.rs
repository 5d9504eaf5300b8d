//! The capture-host executable, launched by the browser's native-messaging
//! machinery. Speaks length-prefixed JSON on stdin/stdout and relays requests
//! to the application over the local control channel.
//!
//! stdout is protocol-only; all diagnostics go to a log file in the temp
//! directory. A corrupted stdin stream exits non-zero so the OS-level host
//! relaunches the process.

use bridge::client::BridgeClientConfig;
use bridge::host::run_host;
use bridge::validator::PayloadLimits;
use memex_core::logger::init_file_only_tracing;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let log_path = std::env::temp_dir().join("memex-capture-host.log");
    // Logging is best-effort; the host must run even if the log file can't
    // be opened.
    let _ = init_file_only_tracing(&log_path.to_string_lossy());

    let client_config = BridgeClientConfig {
        port: bridge::bridge_port(),
        ..BridgeClientConfig::default()
    };
    let limits = PayloadLimits::default();

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();

    let fatal = run_host(&mut stdin, &mut stdout, &client_config, &limits).await;
    error!(error = %fatal, "capture host exiting");
    std::process::exit(1);
}

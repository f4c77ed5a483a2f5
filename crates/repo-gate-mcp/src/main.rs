// crates/repo-gate-mcp/src/main.rs
// ============================================================================
// Module: Gateway Binary
// Description: Entry point wiring configuration, logging, and the server.
// Purpose: Run the stdio tool gateway for one process lifetime.
// Dependencies: repo-gate-config, tokio, tracing-subscriber
// ============================================================================

//! ## Overview
//! Loads configuration from `REPO_GATE_*` variables, initializes `tracing`
//! once (stderr by default, a log file when configured; stdout is reserved
//! for the JSON-RPC protocol), and serves framed requests until stdin closes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::Mutex;

use repo_gate_config::GatewayConfig;
use repo_gate_mcp::GatewayServer;
use repo_gate_mcp::TracingAuditSink;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the gateway: configuration, logging, then the stdio serve loop.
#[tokio::main]
#[allow(
    clippy::print_stderr,
    reason = "Startup failures happen before the logging subscriber exists."
)]
async fn main() -> ExitCode {
    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("repo-gate: configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("repo-gate: logging init failed: {err}");
        return ExitCode::FAILURE;
    }
    let config = match config.init() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("repo-gate: {err}");
            return ExitCode::FAILURE;
        }
    };

    let server = match GatewayServer::from_config(config, Arc::new(TracingAuditSink)) {
        Ok(server) => server,
        Err(err) => {
            tracing::error!(error = %err, "gateway startup failed");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        root = %config.repo_root.display(),
        mode = if config.deployment_mode.is_development() { "development" } else { "production" },
        tenant_auth = config.tenant_auth.is_some(),
        "repo-gate serving on stdio"
    );
    match server.serve_stdio().await {
        Ok(()) => {
            tracing::info!("stdin closed, shutting down");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "gateway terminated");
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Initializes the process-wide `tracing` subscriber.
///
/// Stdout carries the JSON-RPC protocol, so diagnostics go to stderr unless
/// a log file is configured.
fn init_logging(config: &GatewayConfig) -> Result<(), String> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|err| format!("invalid log level `{}`: {err}", config.log_level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);
    match &config.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| format!("cannot open log file {}: {err}", path.display()))?;
            builder
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|err| err.to_string())
        }
        None => builder.with_writer(std::io::stderr).try_init().map_err(|err| err.to_string()),
    }
}

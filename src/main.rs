//! Announcement board admin server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ security headers ─▶ timeout/body limit
//!                                                                     │
//!                         ┌───────────────────────────────────────────┤
//!                         ▼                                           ▼
//!                   public routes                          session (cookie, prune,
//!                                                            client address)
//!                                                                     │
//!                                                                     ▼
//!                                                    admin routes ─▶ guard
//!                                                                 (rate limit, CSRF)
//!                                                                     │
//!                                                                     ▼
//!                                                          audit queue ─▶ writer ─▶ file
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use board_guard::admin::StaticCredentials;
use board_guard::audit::{AuditLog, FileSink};
use board_guard::config::load_or_default;
use board_guard::lifecycle::{wait_for_signal, Shutdown};
use board_guard::observability::{logging, metrics};
use board_guard::HttpServer;

const AUDIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "board-guard", version, about = "Announcement board admin server")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "board-guard starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        login_limit = config.security.login.limit,
        login_window_secs = config.security.login.window_secs,
        audit_log = %config.audit.log_path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (audit, audit_writer) = AuditLog::spawn(
        Arc::new(FileSink::new(&config.audit.log_path)),
        config.audit.queue_capacity,
    );

    let credentials = StaticCredentials::from_config(&config.admin);
    if !credentials.is_enabled() {
        tracing::warn!("No admin password digest configured; admin login is disabled");
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, audit, Arc::new(credentials))?;

    let shutdown = Shutdown::new();
    let stopped = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, stopped).await?;

    // The server held the last senders; the writer drains what is queued and exits.
    match tokio::time::timeout(AUDIT_DRAIN_TIMEOUT, audit_writer).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Audit writer ended abnormally"),
        Err(_) => tracing::warn!("Audit queue not drained before exit"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

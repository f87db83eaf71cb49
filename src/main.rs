//! Demo server for the request logging middleware.
//!
//! Features:
//! - Access log event per request, leveled by response status
//! - JSON error bodies for handlers that abort without writing a body
//! - Buffered log output flushed on a fixed interval and on shutdown, written
//!   to stdout from a background worker thread

use axum::middleware;
use reqlog::{
    Result,
    cli::Cli,
    flusher::Flusher,
    handlers,
    middleware::{log_requests_with, report_errors},
    sink::BufferedSink,
    telemetry,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info};

/// Main entry point that configures and runs the demo server
///
/// Sets up:
/// - Structured logging into a buffered stdout sink
/// - The periodic flusher for that sink
/// - Error reporting and request logging middleware
/// - Graceful shutdown on Ctrl-C, followed by a final flush
#[tokio::main]
async fn main() -> Result<()> {
    let args: Cli = argh::from_env();

    let (sink, _log_worker) = BufferedSink::stdout();
    telemetry::init(args.log_format(), &args.log_filter, sink.clone())?;
    let flusher = Flusher::start(args.flush_interval(), sink)?;

    let config = Arc::new(args.logger_config());
    let app = handlers::routes()
        .layer(middleware::from_fn(report_errors))
        .layer(middleware::from_fn_with_state(config, log_requests_with));

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!("Server running on: http://{}", listener.local_addr()?);
    info!("Flushing logs every {:?}", args.flush_interval());

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    info!("Server stopped");
    flusher.stop().await;
    Ok(served?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

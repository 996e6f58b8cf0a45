//! FlashStream - Line Echo Server
//!
//! This is the demo binary for the FlashStream library. It serves the line
//! echo protocol on one TCP or Unix-domain endpoint until SIGINT or SIGTERM.

use anyhow::Context;
use clap::Parser;
use flashstream::{LineEcho, Server, TransportKind};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the echo server
#[derive(Parser, Debug)]
#[command(name = "flashstream")]
#[command(version = flashstream::VERSION)]
#[command(about = "A line echo server over TCP or Unix-domain sockets", long_about = None)]
struct Args {
    /// Endpoint to listen on: `ip:port` for tcp, a socket path for unix
    endpoint: String,

    /// Transport to use (tcp, unix)
    #[arg(default_value_t = TransportKind::Tcp)]
    transport: TransportKind,

    /// Number of runtime worker threads
    #[arg(short = 'w', long, default_value_t = 4)]
    workers: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.workers.max(1))
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    runtime.block_on(run(args))
}

async fn run(args: Args) -> anyhow::Result<()> {
    info!(
        version = flashstream::VERSION,
        endpoint = %args.endpoint,
        transport = %args.transport,
        workers = args.workers,
        "Starting FlashStream echo server"
    );

    let server = Server::builder()
        .endpoint(args.transport, args.endpoint)
        .handler_factory(LineEcho::new)
        .build()?;

    server.async_run();
    info!(endpoint = %server.local_endpoint(), "Ready to accept connections");

    wait_for_shutdown().await?;

    info!("Shutdown signal received, stopping server...");
    server.shutdown().await;

    info!(
        sessions = server.stats().accepted(),
        "Server shutdown complete"
    );
    Ok(())
}

/// Resolves on the first SIGINT or SIGTERM.
async fn wait_for_shutdown() -> anyhow::Result<()> {
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("failed to install Ctrl+C handler")?,
        _ = terminate.recv() => {}
    }

    Ok(())
}

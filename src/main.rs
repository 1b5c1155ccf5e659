//! WardenScan agent entry point: loads configuration from the
//! environment, resolves this instance's scanner identity, and runs the
//! foreground/background schedulers until signalled to stop.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warden_scheduler::ShutdownHandle;
use wardenscan::config::WardenConfig;
use wardenscan::run::{run_agent, Agent};

/// Distributed sensitive-data scanner agent.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory to scan with the local filesystem connector.
    #[arg(short, long, env = "WARDEN_SCAN_ROOT", default_value = ".")]
    scan_root: PathBuf,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let filter = if args.debug { "debug,wardenscan=trace" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WardenConfig::from_env().context("failed to load configuration from environment")?;
    info!(execution_mode = ?config.execution_mode, "starting wardenscan agent");

    let agent = Agent::bootstrap(&config, args.scan_root)
        .await
        .context("failed to bootstrap agent")?;
    info!(scanner_id = %agent.scanner_id, "agent bootstrapped");
    let agent = Arc::new(agent);

    let (shutdown_handle, shutdown_fg) = ShutdownHandle::new();
    let shutdown_bg = shutdown_fg.clone();

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("failed to install SIGTERM handler")?;

    // `run_agent` itself reacts to `shutdown_handle.trigger()`; it is not
    // raced against the signal futures below so an in-flight chunk can
    // always run to completion instead of being dropped mid-scan.
    let agent_task = tokio::spawn(run_agent(agent, Vec::new(), shutdown_fg, shutdown_bg));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        }
    }
    shutdown_handle.trigger();
    agent_task.await.context("agent task panicked")?;

    Ok(())
}

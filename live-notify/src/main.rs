use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use live_notify::config::AppConfig;
use live_notify::logging;
use live_notify::services::ServiceContainer;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, env = "LIVE_NOTIFY_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Log filter directive, e.g. `live_notify=debug`
    #[arg(long, env = "LIVE_NOTIFY_LOG")]
    log_filter: Option<String>,

    /// Also write daily-rotated log files to this directory
    #[arg(long, env = "LIVE_NOTIFY_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let _log_guard = logging::init_logging(args.log_filter.as_deref(), args.log_dir.as_deref())
        .context("Failed to initialize logging")?;

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        rooms = config.live_rooms.len(),
        interval_secs = config.poll_interval_secs,
        "live-notify starting"
    );

    let cancel = CancellationToken::new();

    if let Some(dir) = args.log_dir.clone() {
        logging::start_retention_cleanup(dir, cancel.child_token());
    }

    let mut container = ServiceContainer::with_cancellation(&config, cancel)
        .context("Failed to initialize services")?;
    container.start()?;

    shutdown_signal().await;

    if let Err(e) = container.shutdown().await {
        error!(error = %e, "Shutdown failed");
    }

    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}

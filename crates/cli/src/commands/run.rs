//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{FeedMode, IngestConfig};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::Pipeline;
use crate::settings;

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.config.display(), "Loading configuration");

    let resolved = settings::resolve(&args.config)?;
    let config = resolved.config;
    config_loader::validate(&config).context("Invalid configuration")?;

    info!(
        source = %resolved.source,
        mode = ?config.feed.mode,
        url = %config.feed.url,
        mmsi_filters = config.feed.filter_mmsi.len(),
        sink = %config.sink.name,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping pipeline...");
        let _ = shutdown_tx.send(true);
    });

    info!("Starting pipeline...");
    let stats = Pipeline::new(config)
        .run(shutdown_rx)
        .await
        .context("Pipeline execution failed")?;

    info!(
        frames_read = stats.totals.frames_read,
        records_written = stats.totals.records_written,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("AIS Ingest finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &IngestConfig) {
    let feed = &config.feed;
    println!("\n=== Configuration Summary ===\n");
    println!("Feed:");
    println!("  Mode: {:?}", feed.mode);
    println!("  Endpoint: {}", feed.url);
    if feed.mode == FeedMode::Poll {
        println!("  Poll interval: {}s", feed.poll_interval_secs);
    }
    println!("  Subscription: {:?}", config.subscription_request());

    println!("\nSupervisor:");
    println!("  Backoff: {}s", config.supervisor.backoff_secs);
    println!("  Reconnect delay: {}s", config.supervisor.reconnect_delay_secs);
    println!("  Restart delay: {}s", config.supervisor.restart_delay_secs);

    println!("\nSink:");
    println!("  {} ({:?})", config.sink.name, config.sink.sink_type);
    println!();
}

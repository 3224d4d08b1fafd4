//! Pipeline orchestrator - builds connector, dispatcher and supervisor.
//!
//! Each generation is built from scratch inside the restart loop, so a
//! crash never leaves a half-used sink or session behind.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ConnectionManager, FeedMode, IngestConfig};
use ingestion::{PollingConnector, StreamConnector};
use supervisor::{run_with_restart, RestartPolicy, StatsSnapshot, Supervisor, SupervisorConfig};
use tokio::sync::{mpsc, watch};
use tracing::info;

use super::PipelineStats;

/// Main pipeline orchestrator
pub struct Pipeline {
    config: IngestConfig,
}

impl Pipeline {
    /// Create a pipeline from a validated configuration
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Run until shutdown, restarting after crashes
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<PipelineStats> {
        let started = Instant::now();
        let policy = RestartPolicy::from(&self.config.supervisor);
        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<StatsSnapshot>();

        let config = self.config;
        let generation_shutdown = shutdown.clone();
        let factory = move || {
            let config = config.clone();
            let shutdown = generation_shutdown.clone();
            let report = report_tx.clone();
            async move {
                let snapshot = run_generation(&config, shutdown).await?;
                // The receiver lives until every generation has finished
                let _ = report.send(snapshot);
                anyhow::Ok(())
            }
        };

        run_with_restart(factory, policy, shutdown).await?;

        let mut stats = PipelineStats {
            duration: started.elapsed(),
            ..Default::default()
        };
        while let Ok(snapshot) = report_rx.try_recv() {
            stats.absorb(&snapshot);
        }

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            records_written = stats.totals.records_written,
            "Pipeline shutdown complete"
        );
        Ok(stats)
    }
}

async fn run_generation(
    config: &IngestConfig,
    shutdown: watch::Receiver<bool>,
) -> Result<StatsSnapshot> {
    match config.feed.mode {
        FeedMode::Stream => {
            let connector = StreamConnector::from_config(&config.feed)
                .context("Failed to create stream connector")?;
            supervise(connector, config, shutdown).await
        }
        FeedMode::Poll => {
            let connector = PollingConnector::from_config(&config.feed)
                .context("Failed to create polling connector")?;
            supervise(connector, config, shutdown).await
        }
    }
}

async fn supervise<C>(
    connector: C,
    config: &IngestConfig,
    shutdown: watch::Receiver<bool>,
) -> Result<StatsSnapshot>
where
    C: ConnectionManager + Sync + 'static,
{
    let dispatcher =
        dispatcher::create_dispatcher(&config.sink).context("Failed to create dispatcher")?;

    info!(
        endpoint = %connector.endpoint(),
        sink = %dispatcher.sink_name(),
        "Starting supervisor"
    );

    let supervisor = Supervisor::new(
        connector,
        config.subscription_request(),
        dispatcher,
        SupervisorConfig::from(&config.supervisor),
    );

    supervisor
        .run(shutdown)
        .await
        .context("Supervisor stopped with an error")
}

//! Supervisor - connection state machine
//!
//! One control task drives `Disconnected -> Connecting -> Subscribed ->
//! Closing -> Disconnected`. While subscribed, a dedicated read task owns
//! the session and the dispatcher; the control task waits for its loss
//! signal, then joins it to get the dispatcher back.

use std::sync::Arc;

use contracts::{ConnectionManager, ConnectionState, DataSink, SubscriptionRequest};
use dispatcher::Dispatcher;
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::SupervisorConfig;
use crate::error::SupervisorError;
use crate::reader::{LossReason, ReadTask};
use crate::shutdown::{is_shutdown, sleep_or_shutdown, wait_for_shutdown};
use crate::stats::{StatsSnapshot, SupervisorStats};

/// Keeps one subscribed session alive for as long as the process runs
pub struct Supervisor<C, S> {
    connector: C,
    request: SubscriptionRequest,
    dispatcher: Dispatcher<S>,
    config: SupervisorConfig,
    stats: Arc<SupervisorStats>,
    state: watch::Sender<ConnectionState>,
}

impl<C, S> Supervisor<C, S>
where
    C: ConnectionManager + Sync + 'static,
    S: DataSink + 'static,
{
    pub fn new(
        connector: C,
        request: SubscriptionRequest,
        dispatcher: Dispatcher<S>,
        config: SupervisorConfig,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            connector,
            request,
            dispatcher,
            config,
            stats: Arc::new(SupervisorStats::new()),
            state,
        }
    }

    /// Observe state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> Arc<SupervisorStats> {
        Arc::clone(&self.stats)
    }

    /// Run until shutdown is requested
    ///
    /// Acquisition failures are retried forever after the fixed backoff. A
    /// lost session is closed exactly once and reacquired after
    /// `reconnect_delay`. On shutdown the sink is flushed and closed.
    ///
    /// # Panics
    /// A panic inside the read task is resumed on the caller.
    #[instrument(name = "supervisor_run", skip_all, fields(endpoint = %self.connector.endpoint()))]
    pub async fn run(
        self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<StatsSnapshot, SupervisorError> {
        let Supervisor {
            connector,
            request,
            mut dispatcher,
            config,
            stats,
            state,
        } = self;
        let set_state = |next: ConnectionState| transition(&state, next);

        info!(
            backoff_secs = config.backoff.as_secs_f64(),
            sink = %dispatcher.sink_name(),
            ?request,
            "Supervisor started"
        );

        'run: loop {
            set_state(ConnectionState::Connecting);

            let session = loop {
                if is_shutdown(&shutdown) {
                    set_state(ConnectionState::Disconnected);
                    break 'run;
                }

                stats.inc_acquire_attempt();
                observability::record_acquire_attempt();

                let result = tokio::select! {
                    biased;
                    _ = wait_for_shutdown(&mut shutdown) => {
                        set_state(ConnectionState::Disconnected);
                        break 'run;
                    }
                    result = connector.acquire(&request) => result,
                };

                match result {
                    Ok(session) => break session,
                    Err(e) => {
                        stats.inc_acquire_failure();
                        observability::record_acquire_failure(e.label());
                        warn!(
                            error = %e,
                            backoff_secs = config.backoff.as_secs_f64(),
                            "Connection attempt failed, retrying after backoff"
                        );
                        if !sleep_or_shutdown(config.backoff, &mut shutdown).await {
                            set_state(ConnectionState::Disconnected);
                            break 'run;
                        }
                        set_state(ConnectionState::Connecting);
                    }
                }
            };

            set_state(ConnectionState::Subscribed);
            stats.inc_session();
            info!("Subscribed to feed");
            let subscribed_at = Instant::now();

            let (lost_tx, lost_rx) = oneshot::channel();
            let reader = ReadTask {
                session,
                dispatcher,
                stats: Arc::clone(&stats),
                shutdown: shutdown.clone(),
                lost: lost_tx,
            };
            let handle = tokio::spawn(reader.run());

            // A dropped sender means the read task panicked; the join below surfaces it
            let reason = lost_rx.await.unwrap_or(LossReason::StreamClosed);
            set_state(ConnectionState::Closing);

            dispatcher = match handle.await {
                Ok(dispatcher) => dispatcher,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => return Err(SupervisorError::ReadTaskCancelled),
            };

            set_state(ConnectionState::Disconnected);
            let held = subscribed_at.elapsed();
            observability::record_session_duration_secs(held.as_secs_f64());

            if reason == LossReason::Shutdown || is_shutdown(&shutdown) {
                break 'run;
            }

            info!(
                session_secs = held.as_secs_f64(),
                delay_secs = config.reconnect_delay.as_secs_f64(),
                "Connection lost, reconnecting"
            );
            if !sleep_or_shutdown(config.reconnect_delay, &mut shutdown).await {
                break 'run;
            }
        }

        info!("Supervisor stopping");
        dispatcher.shutdown().await?;

        let snapshot = stats.snapshot();
        info!(
            sessions = snapshot.sessions,
            frames = snapshot.frames_read,
            written = snapshot.records_written,
            "Supervisor stopped"
        );
        Ok(snapshot)
    }
}

fn transition(state: &watch::Sender<ConnectionState>, next: ConnectionState) {
    let previous = state.send_replace(next);
    if previous == next && next != ConnectionState::Connecting {
        return;
    }
    debug_assert!(
        previous.can_transition_to(next),
        "illegal transition {previous} -> {next}"
    );
    observability::record_connection_state(next);
    debug!(from = %previous, to = %next, "Connection state changed");
}

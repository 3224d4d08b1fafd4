//! Read task: owns the live session and the dispatcher while subscribed

use std::sync::Arc;

use contracts::{DataSink, FeedSession};
use dispatcher::Dispatcher;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::shutdown::wait_for_shutdown;
use crate::stats::SupervisorStats;

/// Why a read task stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    /// The session reported end-of-stream or a transport error
    StreamClosed,
    /// Shutdown was requested
    Shutdown,
}

pub(crate) struct ReadTask<F, S> {
    pub(crate) session: F,
    pub(crate) dispatcher: Dispatcher<S>,
    pub(crate) stats: Arc<SupervisorStats>,
    pub(crate) shutdown: watch::Receiver<bool>,
    pub(crate) lost: oneshot::Sender<LossReason>,
}

impl<F, S> ReadTask<F, S>
where
    F: FeedSession,
    S: DataSink,
{
    /// Read until the stream ends or shutdown, signal the loss once, close
    /// the session once, then hand the dispatcher back.
    pub(crate) async fn run(self) -> Dispatcher<S> {
        let ReadTask {
            mut session,
            mut dispatcher,
            stats,
            mut shutdown,
            lost,
        } = self;

        let reason = loop {
            let frame = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => break LossReason::Shutdown,
                frame = session.read_frame() => frame,
            };

            match frame {
                Ok(raw) => process_frame(&raw, &mut dispatcher, &stats).await,
                Err(e) => {
                    info!(error = %e, "Feed stream ended");
                    break LossReason::StreamClosed;
                }
            }
        };

        // The control task may already be gone during teardown
        let _ = lost.send(reason);
        session.close().await;
        debug!(?reason, "Read task finished");
        dispatcher
    }
}

async fn process_frame<S: DataSink>(
    raw: &[u8],
    dispatcher: &mut Dispatcher<S>,
    stats: &SupervisorStats,
) {
    stats.inc_frame_read();
    observability::record_frame_received();

    let envelope = match ingestion::decode(raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            stats.inc_decode_failure();
            observability::record_decode_failure(e.label());
            warn!(error = %e, bytes = raw.len(), "Dropping undecodable frame");
            return;
        }
    };

    let record_kind = envelope.kind().record_kind();
    match (dispatcher.dispatch(&envelope).await, record_kind) {
        (Ok(()), Some(kind)) => {
            stats.inc_record_written();
            observability::record_dispatched(kind, true);
        }
        (Ok(()), None) => {
            stats.inc_unknown_message();
            observability::record_unknown_message();
        }
        (Err(e), kind) => {
            stats.inc_write_failure();
            if let Some(kind) = kind {
                observability::record_dispatched(kind, false);
            }
            error!(
                error = %e,
                message_type = %envelope.message_type,
                userid = ?envelope.user_id(),
                "Failed to persist record"
            );
        }
    }
}

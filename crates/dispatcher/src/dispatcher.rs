//! Dispatcher - routes decoded envelopes to the sink

use contracts::{DataSink, Envelope, FieldMap, Payload, RecordKind, SinkConfig};
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;
use crate::extract::{position_report_fields, ship_static_fields};
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::sinks::AnySink;

/// Routes each envelope to exactly one sink write, or one log record
///
/// Owns its sink; used by one task at a time.
pub struct Dispatcher<S> {
    sink: S,
    metrics: DispatchMetrics,
}

impl<S: DataSink> Dispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            metrics: DispatchMetrics::new(),
        }
    }

    /// Sink name
    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Dispatch one envelope
    ///
    /// Known kinds produce exactly one `write`; `Other` produces one `info`
    /// record naming the discriminator. Sink errors are returned as-is and
    /// never retried.
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, envelope),
        fields(message_type = %envelope.message_type)
    )]
    pub async fn dispatch(&mut self, envelope: &Envelope) -> Result<(), DispatcherError> {
        self.metrics.inc_dispatched();

        let Some((kind, fields)) = Self::extract(envelope) else {
            self.metrics.inc_unknown();
            info!(message_type = %envelope.message_type, "Unrecognised message type");
            return Ok(());
        };

        match self.sink.write(kind, &fields).await {
            Ok(()) => {
                self.metrics.inc_written();
                debug!(table = kind.table_name(), "Record written");
                Ok(())
            }
            Err(e) => {
                self.metrics.inc_failed();
                Err(DispatcherError::Sink(e))
            }
        }
    }

    fn extract(envelope: &Envelope) -> Option<(RecordKind, FieldMap)> {
        let metadata = envelope.metadata.as_ref();
        match &envelope.payload {
            Payload::PositionReport(report) => Some((
                RecordKind::PositionReport,
                position_report_fields(report, metadata),
            )),
            Payload::ShipStaticData(data) => Some((
                RecordKind::ShipStaticData,
                ship_static_fields(data, metadata),
            )),
            Payload::Other => None,
        }
    }

    /// Flush and close the sink
    #[instrument(name = "dispatcher_shutdown", skip(self), fields(sink = %self.sink.name()))]
    pub async fn shutdown(mut self) -> Result<MetricsSnapshot, DispatcherError> {
        if let Err(e) = self.sink.flush().await {
            warn!(error = %e, "Sink flush failed during shutdown");
        }
        self.sink.close().await?;

        let snapshot = self.metrics.snapshot();
        info!(
            dispatched = snapshot.dispatched,
            written = snapshot.written,
            failed = snapshot.failed,
            unknown = snapshot.unknown,
            "Dispatcher shutdown complete"
        );
        Ok(snapshot)
    }
}

/// Convenience function to create a dispatcher from a sink config
#[instrument(name = "dispatcher_create", skip(config), fields(sink = %config.name))]
pub fn create_dispatcher(config: &SinkConfig) -> Result<Dispatcher<AnySink>, DispatcherError> {
    let sink = AnySink::from_config(config)?;
    Ok(Dispatcher::new(sink))
}

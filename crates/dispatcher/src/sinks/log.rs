//! LogSink - logs records via tracing

use contracts::{ContractError, DataSink, FieldMap, RecordKind};
use tracing::{debug, info, instrument};

/// Sink that logs every record, for local runs and debugging
pub struct LogSink {
    name: String,
    records: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: 0,
        }
    }

    /// Records logged so far
    pub fn records(&self) -> u64 {
        self.records
    }

    fn log_record(&self, kind: RecordKind, fields: &FieldMap) {
        let userid = fields.get("userid").and_then(|v| v.as_i64());
        let rendered = serde_json::to_string(fields).unwrap_or_default();

        info!(
            sink = %self.name,
            table = kind.table_name(),
            userid,
            record = %rendered,
            "Record received"
        );
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, fields),
        fields(sink = %self.name, table = kind.table_name())
    )]
    async fn write(&mut self, kind: RecordKind, fields: &FieldMap) -> Result<(), ContractError> {
        self.log_record(kind, fields);
        self.records += 1;
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, records = self.records, "LogSink closed");
        Ok(())
    }
}

//! FileSink - appends records to per-table NDJSON files

use chrono::{SecondsFormat, Utc};
use contracts::{ContractError, DataSink, FieldMap, RecordKind};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { base_path }
    }
}

/// One output line: the record stamped with its receive time
#[derive(Serialize)]
struct NdjsonLine<'a> {
    received_at: String,
    #[serde(flatten)]
    fields: &'a FieldMap,
}

/// Sink that writes one JSON line per record to `<base_path>/<table>.ndjson`
///
/// Every `write` is flushed, so an I/O error is reported on the record that
/// caused it.
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writers: HashMap<RecordKind, BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        // Create base directory if it doesn't exist
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            writers: HashMap::new(),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    /// Output file for the given record kind
    pub fn path_for(&self, kind: RecordKind) -> PathBuf {
        table_path(&self.config.base_path, kind)
    }

    fn append_line(&mut self, kind: RecordKind, fields: &FieldMap) -> std::io::Result<()> {
        let line = NdjsonLine {
            received_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            fields,
        };

        let writer = match self.writers.entry(kind) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(table_path(&self.config.base_path, kind))?;
                entry.insert(BufWriter::new(file))
            }
        };

        serde_json::to_writer(&mut *writer, &line)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(b"\n")?;
        // each record reaches the file before `write` returns
        writer.flush()
    }

    fn flush_all(&mut self) -> std::io::Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

fn table_path(base: &Path, kind: RecordKind) -> PathBuf {
    base.join(format!("{}.ndjson", kind.table_name()))
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, fields),
        fields(sink = %self.name, table = kind.table_name())
    )]
    async fn write(&mut self, kind: RecordKind, fields: &FieldMap) -> Result<(), ContractError> {
        self.append_line(kind, fields).map_err(|e| {
            error!(sink = %self.name, table = kind.table_name(), error = %e, "Write failed");
            ContractError::persistence_with_source(&self.name, e)
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.flush_all()
            .map_err(|e| ContractError::persistence_with_source(&self.name, e))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush_all()
            .map_err(|e| ContractError::persistence_with_source(&self.name, e))?;
        self.writers.clear();
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

//! Sink implementations
//!
//! Contains LogSink, FileSink and PostgrestSink, plus `AnySink` for picking
//! one from configuration at run time.

mod file;
mod log;
mod postgrest;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::postgrest::{encode_row, point_literal, PostgrestSink, PostgrestSinkConfig};

use contracts::{ContractError, DataSink, FieldMap, RecordKind, SinkConfig, SinkType};
use tracing::instrument;

use crate::error::DispatcherError;

/// Any of the built-in sinks
pub enum AnySink {
    Log(LogSink),
    File(FileSink),
    Postgrest(PostgrestSink),
}

impl AnySink {
    /// Create a sink from configuration
    #[instrument(
        name = "dispatcher_create_sink",
        skip(config),
        fields(sink = %config.name, sink_type = ?config.sink_type)
    )]
    pub fn from_config(config: &SinkConfig) -> Result<Self, DispatcherError> {
        match config.sink_type {
            SinkType::Log => Ok(Self::Log(LogSink::new(&config.name))),
            SinkType::File => {
                let sink = FileSink::from_params(&config.name, &config.params)
                    .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
                Ok(Self::File(sink))
            }
            SinkType::Postgrest => {
                let sink = PostgrestSink::from_params(&config.name, &config.params)
                    .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
                Ok(Self::Postgrest(sink))
            }
        }
    }
}

impl DataSink for AnySink {
    fn name(&self) -> &str {
        match self {
            Self::Log(sink) => sink.name(),
            Self::File(sink) => sink.name(),
            Self::Postgrest(sink) => sink.name(),
        }
    }

    async fn write(&mut self, kind: RecordKind, fields: &FieldMap) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.write(kind, fields).await,
            Self::File(sink) => sink.write(kind, fields).await,
            Self::Postgrest(sink) => sink.write(kind, fields).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.flush().await,
            Self::File(sink) => sink.flush().await,
            Self::Postgrest(sink) => sink.flush().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.close().await,
            Self::File(sink) => sink.close().await,
            Self::Postgrest(sink) => sink.close().await,
        }
    }
}

//! DataSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{ContractError, FieldMap, RecordKind};

/// Data output trait
///
/// All sink implementations must implement this trait. A sink is used by
/// one task at a time; implementations need no internal locking.
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist one record of the given kind
    ///
    /// # Errors
    /// Returns `Persistence` with the underlying cause attached
    async fn write(&mut self, kind: RecordKind, fields: &FieldMap) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}

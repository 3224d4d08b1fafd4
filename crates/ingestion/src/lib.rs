//! # Ingestion
//!
//! Feed ingestion module.
//!
//! Responsibilities:
//! - Decode raw feed frames into `Envelope`
//! - Open feed sessions and send the subscription (`ConnectionManager` impls)
//! - Provide a scripted mock connector for tests
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::{ConnectionManager, FeedSession};
//! use ingestion::{decode, StreamConnector};
//!
//! let connector = StreamConnector::from_config(&config.feed)?;
//! let mut session = connector.acquire(&config.subscription_request()).await?;
//! while let Ok(frame) = session.read_frame().await {
//!     match decode(&frame) {
//!         Ok(envelope) => { /* dispatch */ }
//!         Err(e) => tracing::warn!(error = %e, "undecodable frame"),
//!     }
//! }
//! session.close().await;
//! ```

mod decoder;
mod error;
mod mock;
mod polling;
mod stream;

// Re-exports
pub use decoder::decode;
pub use error::{IngestionError, Result};
pub use mock::{MockConnector, MockScript, MockSession, ScriptEnd};
pub use polling::{
    parse_entries, translate, PollSession, PollingConnector, VesselEntry, VesselRecord,
};
pub use stream::{StreamConnector, WsSession};

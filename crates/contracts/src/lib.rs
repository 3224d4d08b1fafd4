//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Flow
//! `ConnectionManager` -> raw frame -> decoder -> `Envelope` -> dispatcher
//! -> `FieldMap` -> `DataSink`

mod config;
mod error;
mod fields;
mod message;
mod session;
mod sink;
mod state;
mod subscription;

pub use config::*;
pub use error::*;
pub use fields::*;
pub use message::*;
pub use session::*;
pub use sink::*;
pub use state::*;
pub use subscription::*;

//! # Dispatcher
//!
//! 数据分发模块。
//!
//! 负责：
//! - 消费解码后的 `Envelope`
//! - 按消息类型提取字段子集 (`FieldMap`)
//! - 写入 sink (log / file / PostgREST)，失败只记录不重试

pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod sinks;

pub use contracts::{DataSink, Envelope};
pub use dispatcher::{create_dispatcher, Dispatcher};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use sinks::{AnySink, FileSink, LogSink, PostgrestSink};

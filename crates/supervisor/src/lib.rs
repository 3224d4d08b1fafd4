//! # Supervisor
//!
//! 连接状态机与重启策略。
//!
//! 负责：
//! - 建连失败后按固定退避无限重试
//! - 订阅期间由独立读任务持有会话与分发器
//! - 断线后恰好关闭一次会话并重新建连
//! - 进程级崩溃重启 (`run_with_restart`)
//!
//! ## 使用示例
//!
//! ```ignore
//! use supervisor::{Supervisor, SupervisorConfig};
//!
//! let dispatcher = dispatcher::create_dispatcher(&config.sink)?;
//! let connector = ingestion::StreamConnector::from_config(&config.feed)?;
//! let supervisor = Supervisor::new(
//!     connector,
//!     config.subscription_request(),
//!     dispatcher,
//!     SupervisorConfig::from(&config.supervisor),
//! );
//! let stats = supervisor.run(shutdown_rx).await?;
//! ```

mod config;
mod error;
mod reader;
mod restart;
mod shutdown;
mod stats;
mod supervisor;

pub use config::{RestartPolicy, SupervisorConfig};
pub use error::SupervisorError;
pub use reader::LossReason;
pub use restart::run_with_restart;
pub use shutdown::{is_shutdown, sleep_or_shutdown, wait_for_shutdown};
pub use stats::{StatsSnapshot, SupervisorStats};
pub use supervisor::Supervisor;

pub use contracts::ConnectionState;

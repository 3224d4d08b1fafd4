//! IngestConfig - Config Loader 输出
//!
//! 描述完整的运行配置：数据源、订阅过滤、监督策略、输出 sink。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::{BoundingBox, SubscriptionRequest};

/// 默认实时流地址
pub const DEFAULT_STREAM_URL: &str = "wss://stream.aisstream.io/v0/stream";

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的运行配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 数据源设置
    #[serde(default)]
    pub feed: FeedConfig,

    /// 监督 / 重连策略
    #[serde(default)]
    pub supervisor: SupervisorSettings,

    /// 输出配置
    #[serde(default)]
    pub sink: SinkConfig,
}

impl IngestConfig {
    /// 根据 feed 配置构造订阅请求
    pub fn subscription_request(&self) -> SubscriptionRequest {
        SubscriptionRequest::new(
            self.feed.api_key.clone(),
            self.feed.bounding_boxes.clone(),
            self.feed.filter_mmsi.clone(),
        )
    }
}

/// 数据源模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// WebSocket 推送流
    #[default]
    Stream,
    /// HTTP 周期轮询
    Poll,
}

/// 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// 模式
    #[serde(default)]
    pub mode: FeedMode,

    /// 端点地址 (stream: ws/wss, poll: http/https)
    #[serde(default = "default_feed_url")]
    pub url: String,

    /// Feed API key
    #[serde(default)]
    pub api_key: String,

    /// 订阅区域，空表示全球
    #[serde(default)]
    pub bounding_boxes: Vec<BoundingBox>,

    /// MMSI 过滤，空表示不过滤
    #[serde(default)]
    pub filter_mmsi: Vec<String>,

    /// 轮询间隔 (秒)，仅 poll 模式
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// 建连超时 (秒)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mode: FeedMode::default(),
            url: default_feed_url(),
            api_key: String::new(),
            bounding_boxes: Vec::new(),
            filter_mmsi: Vec::new(),
            poll_interval_secs: default_poll_interval_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_feed_url() -> String {
    DEFAULT_STREAM_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    600
}

fn default_connect_timeout_secs() -> u64 {
    30
}

/// 监督策略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorSettings {
    /// 建连失败后的固定退避 (秒)
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// 连接丢失后重新建连前的等待 (秒)
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// 进程边界捕获异常后重建前的等待 (秒)
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
}

impl SupervisorSettings {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            backoff_secs: default_backoff_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            restart_delay_secs: default_restart_delay_secs(),
        }
    }
}

fn default_backoff_secs() -> u64 {
    60
}

fn default_reconnect_delay_secs() -> u64 {
    1
}

fn default_restart_delay_secs() -> u64 {
    60
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            name: "log".to_string(),
            sink_type: SinkType::Log,
            params: HashMap::new(),
        }
    }
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// tracing 日志
    Log,
    /// NDJSON 文件
    File,
    /// PostgREST (Supabase) 单行插入
    Postgrest,
}

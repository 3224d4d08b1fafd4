//! 配置校验模块
//!
//! 校验规则：
//! - URL scheme 与数据源模式匹配 (stream: ws/wss, poll: http/https)
//! - stream 模式必须提供 api_key
//! - bounding box 坐标范围合法
//! - 各间隔 > 0
//! - sink 必填字段齐全

use contracts::{ContractError, FeedMode, IngestConfig, SinkType};

/// 校验 IngestConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &IngestConfig) -> Result<(), ContractError> {
    validate_feed_endpoint(config)?;
    validate_bounding_boxes(config)?;
    validate_intervals(config)?;
    validate_sink(config)?;
    Ok(())
}

/// 校验端点地址与 API key
fn validate_feed_endpoint(config: &IngestConfig) -> Result<(), ContractError> {
    let feed = &config.feed;
    let scheme = feed.url.split_once("://").map(|(scheme, _)| scheme);

    let allowed: &[&str] = match feed.mode {
        FeedMode::Stream => &["ws", "wss"],
        FeedMode::Poll => &["http", "https"],
    };

    match scheme {
        Some(s) if allowed.contains(&s.to_ascii_lowercase().as_str()) => {}
        _ => {
            return Err(ContractError::config_validation(
                "feed.url",
                format!(
                    "url '{}' must use one of {:?} in {:?} mode",
                    feed.url, allowed, feed.mode
                ),
            ));
        }
    }

    if feed.mode == FeedMode::Stream && feed.api_key.trim().is_empty() {
        return Err(ContractError::config_validation(
            "feed.api_key",
            "api_key is required in stream mode",
        ));
    }

    Ok(())
}

/// 校验订阅区域坐标
fn validate_bounding_boxes(config: &IngestConfig) -> Result<(), ContractError> {
    for (idx, bbox) in config.feed.bounding_boxes.iter().enumerate() {
        for (lat, lon) in bbox.corners() {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(ContractError::config_validation(
                    format!("feed.bounding_boxes[{idx}]"),
                    format!("corner [{lat}, {lon}] out of range"),
                ));
            }
        }
    }
    Ok(())
}

/// 校验时间间隔
fn validate_intervals(config: &IngestConfig) -> Result<(), ContractError> {
    let checks = [
        ("feed.poll_interval_secs", config.feed.poll_interval_secs),
        ("feed.connect_timeout_secs", config.feed.connect_timeout_secs),
        ("supervisor.backoff_secs", config.supervisor.backoff_secs),
        (
            "supervisor.restart_delay_secs",
            config.supervisor.restart_delay_secs,
        ),
    ];

    for (field, value) in checks {
        if value == 0 {
            return Err(ContractError::config_validation(field, "must be > 0"));
        }
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sink(config: &IngestConfig) -> Result<(), ContractError> {
    let sink = &config.sink;
    if sink.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name cannot be empty",
        ));
    }

    let required: &[&str] = match sink.sink_type {
        SinkType::Postgrest => &["url", "api_key"],
        SinkType::File | SinkType::Log => &[],
    };

    for param in required {
        let present = sink
            .params
            .get(*param)
            .is_some_and(|value| !value.trim().is_empty());
        if !present {
            return Err(ContractError::config_validation(
                format!("sink.params.{param}"),
                format!("required for {:?} sink", sink.sink_type),
            ));
        }
    }
    Ok(())
}

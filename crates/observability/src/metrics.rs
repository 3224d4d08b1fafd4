//! 指标记录
//!
//! 通过 `metrics` facade 记录，由 Prometheus exporter 导出；
//! 未安装 recorder 时所有调用均为空操作。

use contracts::{ConnectionState, RecordKind};
use metrics::{counter, gauge, histogram};

/// 记录收到的原始帧
pub fn record_frame_received() {
    counter!("ais_ingest_frames_received_total").increment(1);
}

/// 记录解码失败 (按原因分类)
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_decode_failure;
///
/// if let Err(e) = ingestion::decode(&frame) {
///     record_decode_failure(e.label());
/// }
/// ```
pub fn record_decode_failure(reason: &'static str) {
    counter!("ais_ingest_decode_failures_total", "reason" => reason).increment(1);
}

/// 记录一次分发写入结果
pub fn record_dispatched(kind: RecordKind, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "ais_ingest_records_dispatched_total",
        "table" => kind.table_name(),
        "status" => status
    )
    .increment(1);
}

/// 记录未识别的消息类型
///
/// 标签固定为 `other`；具体的 `MessageType` 只写入日志，避免标签基数无界。
pub fn record_unknown_message() {
    counter!("ais_ingest_unknown_messages_total", "kind" => "other").increment(1);
}

/// 记录一次建连尝试
pub fn record_acquire_attempt() {
    counter!("ais_ingest_acquire_attempts_total").increment(1);
}

/// 记录建连失败
pub fn record_acquire_failure(reason: &'static str) {
    counter!("ais_ingest_acquire_failures_total", "reason" => reason).increment(1);
}

/// 记录当前连接状态
pub fn record_connection_state(state: ConnectionState) {
    gauge!("ais_ingest_connection_state").set(f64::from(state.code()));
}

/// 记录会话时长 (秒)
pub fn record_session_duration_secs(secs: f64) {
    histogram!("ais_ingest_session_duration_seconds").record(secs);
}

/// 记录进程边界的重启
pub fn record_restart(cause: &'static str) {
    counter!("ais_ingest_restarts_total", "cause" => cause).increment(1);
}

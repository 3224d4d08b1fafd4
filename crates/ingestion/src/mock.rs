//! Mock 连接器
//!
//! 用于无真实数据源环境的测试：可脚本化建连失败次数与每个会话的帧序列，
//! 并记录建连时刻、发送的订阅请求以及 close 调用次数。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use contracts::{ConnectionManager, ContractError, FeedSession, SubscriptionRequest};
use tokio::time::Instant;
use tracing::debug;

const MOCK_ENDPOINT: &str = "mock://feed";

/// 会话帧序列结束后的行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptEnd {
    /// 返回 `StreamClosed`
    #[default]
    Close,
    /// 永远挂起，直到外部关闭
    Hang,
}

/// 单个会话的脚本
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    frames: Vec<Bytes>,
    frame_interval: Duration,
    end: ScriptEnd,
}

impl MockScript {
    /// 依次返回给定帧，然后以 `StreamClosed` 结束
    pub fn frames<I, B>(frames: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            frames: frames.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// 不产生任何帧，一直挂起
    pub fn hang() -> Self {
        Self {
            end: ScriptEnd::Hang,
            ..Default::default()
        }
    }

    /// 每帧之前等待的时长
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// 帧序列结束后的行为
    pub fn then(mut self, end: ScriptEnd) -> Self {
        self.end = end;
        self
    }
}

#[derive(Default)]
struct MockState {
    failures_remaining: usize,
    scripts: VecDeque<MockScript>,
    acquisitions: Vec<Instant>,
    requests: Vec<SubscriptionRequest>,
    close_counters: Vec<Arc<AtomicUsize>>,
}

/// Mock 连接管理器
///
/// 克隆共享同一份状态，便于测试在交给 supervisor 之后继续观察。
/// 脚本耗尽后返回一直挂起的会话。
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 前 `count` 次建连返回 `DialFailed`
    pub fn fail_first(self, count: usize) -> Self {
        self.lock().failures_remaining = count;
        self
    }

    /// 追加一个会话脚本
    pub fn with_session(self, script: MockScript) -> Self {
        self.lock().scripts.push_back(script);
        self
    }

    /// 建连调用次数 (含失败)
    pub fn acquire_count(&self) -> usize {
        self.lock().acquisitions.len()
    }

    /// 每次建连调用的时刻
    pub fn acquisitions(&self) -> Vec<Instant> {
        self.lock().acquisitions.clone()
    }

    /// 成功建连时发送的订阅请求
    pub fn requests(&self) -> Vec<SubscriptionRequest> {
        self.lock().requests.clone()
    }

    /// 每个已建立会话的 close 调用次数
    pub fn close_counts(&self) -> Vec<usize> {
        self.lock()
            .close_counters
            .iter()
            .map(|counter| counter.load(Ordering::SeqCst))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionManager for MockConnector {
    type Session = MockSession;

    fn endpoint(&self) -> &str {
        MOCK_ENDPOINT
    }

    async fn acquire(&self, request: &SubscriptionRequest) -> Result<MockSession, ContractError> {
        let mut state = self.lock();
        state.acquisitions.push(Instant::now());

        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(ContractError::dial_failed(
                MOCK_ENDPOINT,
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "scripted failure"),
            ));
        }

        let script = state.scripts.pop_front().unwrap_or_else(MockScript::hang);
        let close_count = Arc::new(AtomicUsize::new(0));
        state.close_counters.push(close_count.clone());
        state.requests.push(request.clone());

        debug!(frames = script.frames.len(), "mock session opened");
        Ok(MockSession {
            frames: script.frames.into(),
            frame_interval: script.frame_interval,
            end: script.end,
            close_count,
            closed: false,
        })
    }
}

/// Mock 会话
pub struct MockSession {
    frames: VecDeque<Bytes>,
    frame_interval: Duration,
    end: ScriptEnd,
    close_count: Arc<AtomicUsize>,
    closed: bool,
}

impl FeedSession for MockSession {
    async fn read_frame(&mut self) -> Result<Bytes, ContractError> {
        if self.closed {
            return Err(ContractError::stream_closed("session already closed"));
        }

        if let Some(frame) = self.frames.pop_front() {
            if !self.frame_interval.is_zero() {
                tokio::time::sleep(self.frame_interval).await;
            }
            return Ok(frame);
        }

        match self.end {
            ScriptEnd::Close => Err(ContractError::stream_closed("script finished")),
            ScriptEnd::Hang => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        // 记录每一次调用，便于断言 "至多一次"
        self.close_count.fetch_add(1, Ordering::SeqCst);
        self.closed = true;
    }
}

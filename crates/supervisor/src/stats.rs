//! Supervisor counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared between the control task and the read task
#[derive(Debug, Default)]
pub struct SupervisorStats {
    acquire_attempts: AtomicU64,
    acquire_failures: AtomicU64,
    sessions: AtomicU64,
    frames_read: AtomicU64,
    decode_failures: AtomicU64,
    records_written: AtomicU64,
    write_failures: AtomicU64,
    unknown_messages: AtomicU64,
}

/// Point-in-time copy of [`SupervisorStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub acquire_attempts: u64,
    pub acquire_failures: u64,
    pub sessions: u64,
    pub frames_read: u64,
    pub decode_failures: u64,
    pub records_written: u64,
    pub write_failures: u64,
    pub unknown_messages: u64,
}

impl SupervisorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn inc_acquire_attempt(&self) {
        self.acquire_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_acquire_failure(&self) {
        self.acquire_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_session(&self) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_frame_read(&self) {
        self.frames_read.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_record_written(&self) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_unknown_message(&self) {
        self.unknown_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            acquire_attempts: self.acquire_attempts.load(Ordering::Relaxed),
            acquire_failures: self.acquire_failures.load(Ordering::Relaxed),
            sessions: self.sessions.load(Ordering::Relaxed),
            frames_read: self.frames_read.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            unknown_messages: self.unknown_messages.load(Ordering::Relaxed),
        }
    }
}

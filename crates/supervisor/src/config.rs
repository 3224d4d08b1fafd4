//! Supervisor runtime settings

use std::time::Duration;

use contracts::SupervisorSettings;

/// Timing policy for the connection loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Fixed wait after a failed acquisition
    pub backoff: Duration,
    /// Wait after a lost connection before reacquiring
    pub reconnect_delay: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::from(&SupervisorSettings::default())
    }
}

impl From<&SupervisorSettings> for SupervisorConfig {
    fn from(settings: &SupervisorSettings) -> Self {
        Self {
            backoff: settings.backoff(),
            reconnect_delay: settings.reconnect_delay(),
        }
    }
}

/// Process-boundary restart policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Wait before rebuilding after a crash
    pub delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::from(&SupervisorSettings::default())
    }
}

impl From<&SupervisorSettings> for RestartPolicy {
    fn from(settings: &SupervisorSettings) -> Self {
        Self {
            delay: settings.restart_delay(),
        }
    }
}

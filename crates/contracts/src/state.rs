//! ConnectionState - Supervisor state machine
//!
//! Cyclic: `Disconnected -> Connecting -> Subscribed -> Closing -> Disconnected`.

use std::fmt;

/// Supervisor connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Subscribed,
    Closing,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Closing => "closing",
        }
    }

    /// Numeric code for gauges
    pub fn code(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Subscribed => 2,
            Self::Closing => 3,
        }
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connecting)
                | (Self::Connecting, Self::Subscribed)
                | (Self::Connecting, Self::Disconnected)
                | (Self::Subscribed, Self::Closing)
                | (Self::Closing, Self::Disconnected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

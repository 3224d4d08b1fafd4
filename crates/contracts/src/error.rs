//! Layered error definitions
//!
//! Categorized by source: config / connection / decode / persistence

use thiserror::Error;

/// Boxed underlying cause attached to an error
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Connection Errors =====
    /// Transport connection could not be established
    #[error("dial to '{endpoint}' failed: {message}")]
    DialFailed {
        endpoint: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Subscription request could not be delivered
    #[error("subscription handshake with '{endpoint}' failed: {message}")]
    HandshakeFailed {
        endpoint: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Remote end terminated the session or the read failed
    #[error("stream closed: {reason}")]
    StreamClosed { reason: String },

    // ===== Decode Errors =====
    /// Frame is not well-formed structured data
    #[error("malformed frame: {message}")]
    MalformedFrame { message: String },

    /// Frame is well-formed but the discriminator or payload is missing
    #[error("unknown frame shape: {message}")]
    UnknownShape { message: String },

    // ===== Sink Errors =====
    /// Persistence backend rejected or could not receive a write
    #[error("sink '{sink_name}' persistence error: {message}")]
    Persistence {
        sink_name: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create dial error with its underlying cause
    pub fn dial_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DialFailed {
            endpoint: endpoint.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create handshake error with its underlying cause
    pub fn handshake_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::HandshakeFailed {
            endpoint: endpoint.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create stream closed signal
    pub fn stream_closed(reason: impl Into<String>) -> Self {
        Self::StreamClosed {
            reason: reason.into(),
        }
    }

    /// Create malformed frame error
    pub fn malformed_frame(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }

    /// Create unknown shape error
    pub fn unknown_shape(message: impl Into<String>) -> Self {
        Self::UnknownShape {
            message: message.into(),
        }
    }

    /// Create persistence error without an underlying cause
    pub fn persistence(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            sink_name: sink_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create persistence error with the underlying cause attached
    pub fn persistence_with_source(
        sink_name: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Persistence {
            sink_name: sink_name.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error belongs to connection establishment (retried by the supervisor)
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::DialFailed { .. } | Self::HandshakeFailed { .. })
    }

    /// Whether this error is a per-frame decode problem
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::MalformedFrame { .. } | Self::UnknownShape { .. })
    }

    /// Short stable label, used as a metrics dimension
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::DialFailed { .. } => "dial_failed",
            Self::HandshakeFailed { .. } => "handshake_failed",
            Self::StreamClosed { .. } => "stream_closed",
            Self::MalformedFrame { .. } => "malformed_frame",
            Self::UnknownShape { .. } => "unknown_shape",
            Self::Persistence { .. } => "persistence",
            Self::SinkConnection { .. } => "sink_connection",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_persistence_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ContractError::persistence_with_source("supabase", io);

        assert_eq!(err.label(), "persistence");
        assert!(err.source().is_some());
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_error_classification() {
        let io = std::io::Error::other("boom");
        assert!(ContractError::dial_failed("wss://feed", io).is_connection_error());
        assert!(ContractError::malformed_frame("eof").is_decode_error());
        assert!(!ContractError::stream_closed("eof").is_connection_error());
    }
}

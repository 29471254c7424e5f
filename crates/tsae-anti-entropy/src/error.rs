//! Error types for sessions and configuration.

use thiserror::Error;

/// Reasons a TSAE session was abandoned.
///
/// Errors never escape the session boundary: the runtime logs them and the
/// peer is simply tried again on the next round. Operations admitted before
/// the failure stay admitted.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connection refused, reset, closed, or any read/write failure
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame body that does not decode as a session message
    #[error("malformed message: {0}")]
    Decode(String),

    /// A local message that could not be encoded
    #[error("failed to encode message: {0}")]
    Encode(String),

    /// Frame length prefix exceeds the configured limit
    #[error("frame of {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Announced frame size
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// Peer speaks a different wire schema
    #[error("wire schema mismatch: expected v{expected}, found v{found}")]
    SchemaMismatch {
        /// Local schema version
        expected: u16,
        /// Version carried by the peer's message
        found: u16,
    },

    /// Message type arrived out of protocol order
    #[error("unexpected {found} message while waiting for {expected}")]
    UnexpectedMessage {
        /// What the session state machine was waiting for
        expected: &'static str,
        /// Kind of message actually received
        found: &'static str,
    },

    /// Deadline imposed by the runtime elapsed
    #[error("session timed out")]
    Timeout,
}

impl SessionError {
    /// Transient failures only abandon the current session. Everything else
    /// signals an incompatible peer or a bug and is reported loudly.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Io(_) | SessionError::Timeout)
    }
}

/// Result alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Configuration loading and validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file did not parse
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// Configuration parsed but violates a constraint
    #[error("invalid configuration value: {0}")]
    Invalid(String),

    /// File extension is neither `.toml` nor `.json`
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

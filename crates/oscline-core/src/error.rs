//! Shared error type across oscline crates.

use thiserror::Error;

use crate::protocol::tag::{ArgKind, RawType};

/// Stable error codes (for logs, counters, and test vectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bytes do not form a valid OSC packet.
    MalformedPacket,
    /// Typed read against an incompatible tag.
    TypeMismatch,
    /// Builder used out of order or finalized too early.
    BuilderMisuse,
    /// Caller-supplied buffer cannot hold the next write.
    BufferTooSmall,
    /// Bundle nesting exceeds the configured limit.
    NestingTooDeep,
    /// Invalid gateway configuration.
    InvalidConfig,
    /// Socket level failure.
    Io,
    /// A registered listener reported a failure.
    Listener,
}

impl ErrorCode {
    /// String representation used in logs and vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MalformedPacket => "MALFORMED_PACKET",
            ErrorCode::TypeMismatch => "TYPE_MISMATCH",
            ErrorCode::BuilderMisuse => "BUILDER_MISUSE",
            ErrorCode::BufferTooSmall => "BUFFER_TOO_SMALL",
            ErrorCode::NestingTooDeep => "NESTING_TOO_DEEP",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::Io => "IO",
            ErrorCode::Listener => "LISTENER",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, OscError>;

/// Unified error type used by the codec and the gateway.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OscError {
    #[error("malformed packet: {0}")]
    MalformedPacket(String),
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: ArgKind, found: RawType },
    #[error("builder misuse: {0}")]
    BuilderMisuse(String),
    #[error("buffer too small: need {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("bundle nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("io: {0}")]
    Io(String),
    #[error("listener {name} failed: {msg}")]
    Listener { name: &'static str, msg: String },
}

impl OscError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            OscError::MalformedPacket(_) => ErrorCode::MalformedPacket,
            OscError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            OscError::BuilderMisuse(_) => ErrorCode::BuilderMisuse,
            OscError::BufferTooSmall { .. } => ErrorCode::BufferTooSmall,
            OscError::NestingTooDeep { .. } => ErrorCode::NestingTooDeep,
            OscError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            OscError::Io(_) => ErrorCode::Io,
            OscError::Listener { .. } => ErrorCode::Listener,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        OscError::MalformedPacket(msg.into())
    }

    pub(crate) fn misuse(msg: impl Into<String>) -> Self {
        OscError::BuilderMisuse(msg.into())
    }
}

impl From<std::io::Error> for OscError {
    fn from(e: std::io::Error) -> Self {
        OscError::Io(e.to_string())
    }
}

//! Protocol-level errors for frame and statistics processing
//!
//! Each variant carries enough context to tell a truncated read apart from a
//! peer that speaks a different protocol.

use thiserror::Error;

/// Framing and marshaling errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Buffer is too small to contain the header and length field
    #[error("Message too small: need {need} bytes, got {got} (context: {context})")]
    MessageTooSmall {
        need: usize,
        got: usize,
        context: String,
    },

    /// The 5-byte header did not match `ZBXD\x01`
    #[error("Invalid header: expected {expected:02x?}, got {actual:02x?} (indicates: {diagnosis})")]
    InvalidHeader {
        expected: [u8; 5],
        actual: Vec<u8>,
        diagnosis: String,
    },

    /// Body ended before the declared length
    #[error("Truncated body: declared {declared} bytes, got {got}")]
    Truncated { declared: u64, got: usize },

    /// Bytes left over after the declared body
    #[error("Trailing bytes after body: declared {declared} bytes, got {got}")]
    TrailingBytes { declared: u64, got: usize },

    /// Declared body length exceeds the configured limit
    #[error("Message too large: {size} bytes exceeds maximum {max}")]
    MessageTooLarge { size: u64, max: usize },

    /// JSON encoding or decoding failed
    #[error("JSON error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A metric was placed into a packet of the other delivery mode
    #[error("Metric {host}/{key} is {actual} but packet carries {expected} metrics")]
    ModeMismatch {
        host: String,
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl ProtocolError {
    pub fn message_too_small(need: usize, got: usize, context: impl Into<String>) -> Self {
        Self::MessageTooSmall {
            need,
            got,
            context: context.into(),
        }
    }

    /// Create an InvalidHeader error with a hint about what the peer sent
    pub fn invalid_header(expected: [u8; 5], actual: &[u8]) -> Self {
        let diagnosis = if actual.iter().all(|b| *b == 0) {
            "uninitialized buffer"
        } else if actual.starts_with(&expected[..4]) {
            "unsupported protocol flags (compressed or large packet)"
        } else if actual.starts_with(b"HTTP") {
            "peer answered with HTTP"
        } else {
            "peer does not speak the sender protocol"
        };

        Self::InvalidHeader {
            expected,
            actual: actual.to_vec(),
            diagnosis: diagnosis.to_string(),
        }
    }

    pub fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }
}

/// Result type for codec operations
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

/// Errors from turning a response info string into statistics
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InfoError {
    /// Statistics are only defined for successful responses
    #[error("Cannot read statistics from a response with status '{status}'")]
    InvalidState { status: String },

    /// Info string did not match `processed: N; failed: N; total: N; seconds spent: F`
    #[error("Malformed info string '{info}': {reason}")]
    Parse { info: String, reason: String },
}

impl InfoError {
    pub fn parse(info: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            info: info.to_string(),
            reason: reason.into(),
        }
    }
}

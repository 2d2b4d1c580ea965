//! Sender Error Types
//!
//! Every failure of a send carries the collector address it happened at, so
//! a caller can tell a refused connection on one proxy from a rejection by
//! another.

use std::fmt;
use thiserror::Error;
use zbx_codec::ProtocolError;

use crate::address::{AddressError, CollectorAddress};

/// Phase of a single exchange an I/O failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoPhase {
    /// Opening the TCP connection
    Establish,
    /// Writing the request frame
    Write,
    /// Reading the response frame
    Read,
}

impl fmt::Display for IoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            IoPhase::Establish => "establish",
            IoPhase::Write => "write",
            IoPhase::Read => "read",
        };
        f.write_str(phase)
    }
}

/// One failed starting address during host fallback
#[derive(Debug)]
pub struct HostFailure {
    pub address: CollectorAddress,
    pub error: SenderError,
}

/// Main sender error type
#[derive(Error, Debug)]
pub enum SenderError {
    /// TCP connection could not be established within the connect timeout
    #[error("Connection error: failed to connect to {address}: {message}")]
    Connect {
        address: CollectorAddress,
        message: String,
        source: Option<std::io::Error>,
    },

    /// Write or read failed (or timed out) on an established connection
    #[error("I/O error: failed to {phase} {address}: {message}")]
    Io {
        phase: IoPhase,
        address: CollectorAddress,
        message: String,
        source: Option<std::io::Error>,
    },

    /// Collector answered with something that is not a valid response frame
    #[error("Protocol error from {address}: {source}")]
    Protocol {
        address: CollectorAddress,
        source: ProtocolError,
    },

    /// Packet could not be built or serialized
    #[error("Encoding error: {0}")]
    Encode(#[from] ProtocolError),

    /// Collector answered "failed" without a redirect
    #[error("Rejected by {address}: {info}")]
    Rejected {
        address: CollectorAddress,
        info: String,
    },

    /// Redirect descriptor named an address that cannot be used
    #[error("Invalid redirect from {from} to '{target}': {source}")]
    InvalidRedirect {
        from: CollectorAddress,
        target: String,
        source: AddressError,
    },

    /// Redirect chain longer than the configured bound
    #[error("Max redirects ({max}) exceeded starting from {start}")]
    RedirectLimitExceeded { start: CollectorAddress, max: usize },

    /// Cached primary and every configured address failed
    #[error("All {attempted} collector addresses failed")]
    AllHostsFailed {
        attempted: usize,
        failures: Vec<HostFailure>,
    },

    /// Registration not confirmed after the second round
    #[error("Registration of host '{host}' failed: {info}")]
    RegistrationFailed { host: String, info: String },

    /// Invalid sender configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },
}

/// Result type alias for sender operations
pub type Result<T> = std::result::Result<T, SenderError>;

impl SenderError {
    pub fn connect(address: &CollectorAddress, source: std::io::Error) -> Self {
        Self::Connect {
            address: address.clone(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub fn connect_timeout(address: &CollectorAddress, timeout_ms: u64) -> Self {
        Self::Connect {
            address: address.clone(),
            message: format!("timed out after {}ms", timeout_ms),
            source: None,
        }
    }

    pub fn io(phase: IoPhase, address: &CollectorAddress, source: std::io::Error) -> Self {
        Self::Io {
            phase,
            address: address.clone(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub fn io_timeout(phase: IoPhase, address: &CollectorAddress, timeout_ms: u64) -> Self {
        Self::Io {
            phase,
            address: address.clone(),
            message: format!("timed out after {}ms", timeout_ms),
            source: None,
        }
    }

    pub fn protocol(address: &CollectorAddress, source: ProtocolError) -> Self {
        Self::Protocol {
            address: address.clone(),
            source,
        }
    }

    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(|s| s.to_string()),
        }
    }

    /// Exchange phase this error belongs to, for connection-level failures
    pub fn phase(&self) -> Option<IoPhase> {
        match self {
            SenderError::Connect { .. } => Some(IoPhase::Establish),
            SenderError::Io { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Collector address the failure happened at, when there is exactly one
    pub fn address(&self) -> Option<&CollectorAddress> {
        match self {
            SenderError::Connect { address, .. }
            | SenderError::Io { address, .. }
            | SenderError::Protocol { address, .. }
            | SenderError::Rejected { address, .. } => Some(address),
            SenderError::InvalidRedirect { from, .. } => Some(from),
            SenderError::RedirectLimitExceeded { start, .. } => Some(start),
            _ => None,
        }
    }

    /// Collector's info text when every attempt ended in a plain rejection
    pub fn rejection_info(&self) -> Option<&str> {
        match self {
            SenderError::Rejected { info, .. } => Some(info),
            SenderError::AllHostsFailed { failures, .. } => {
                let mut infos = failures.iter().map(|f| f.error.rejection_info());
                let first = infos.next()??;
                infos.all(|i| i.is_some()).then_some(first)
            }
            _ => None,
        }
    }

    /// Info text of the first collector rejection, even among other failures
    pub fn first_rejection(&self) -> Option<&str> {
        match self {
            SenderError::Rejected { info, .. } => Some(info),
            SenderError::AllHostsFailed { failures, .. } => {
                failures.iter().find_map(|f| f.error.first_rejection())
            }
            _ => None,
        }
    }

    /// Check if a later identical send might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SenderError::Connect { .. } => true,
            SenderError::Io { .. } => true,
            SenderError::AllHostsFailed { failures, .. } => {
                failures.iter().any(|f| f.error.is_transient())
            }
            _ => false,
        }
    }

    /// Get error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            SenderError::Connect { .. } => "connect",
            SenderError::Io { .. } => "io",
            SenderError::Protocol { .. } => "protocol",
            SenderError::Encode(_) => "encode",
            SenderError::Rejected { .. } => "rejected",
            SenderError::InvalidRedirect { .. } => "invalid_redirect",
            SenderError::RedirectLimitExceeded { .. } => "redirect_limit",
            SenderError::AllHostsFailed { .. } => "all_hosts_failed",
            SenderError::RegistrationFailed { .. } => "registration",
            SenderError::Configuration { .. } => "configuration",
        }
    }
}

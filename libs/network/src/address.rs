//! Collector address normalization
//!
//! Configured hosts and redirect targets both go through [`CollectorAddress::parse`]
//! so every TCP attempt has a non-empty host and a valid port.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zbx_config::defaults::DEFAULT_PORT;

/// Why an address string was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address '{0}' has no host")]
    MissingHost(String),

    #[error("address '{address}' has invalid port '{port}'")]
    InvalidPort { address: String, port: String },

    #[error("address '{0}' has an unterminated IPv6 literal")]
    UnterminatedIpv6(String),
}

/// Normalized `host:port` of a collector (server or proxy)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectorAddress {
    host: String,
    port: u16,
}

impl CollectorAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host`, `host:port`, `[v6]`, `[v6]:port` or a bare IPv6 literal
    ///
    /// Addresses without a port get the collector default (10051).
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let (host, port) = if let Some(rest) = trimmed.strip_prefix('[') {
            let end = rest
                .find(']')
                .ok_or_else(|| AddressError::UnterminatedIpv6(trimmed.to_string()))?;
            let host = &rest[..end];
            let tail = &rest[end + 1..];
            let port = match tail.strip_prefix(':') {
                Some(port) => Some(port),
                None if tail.is_empty() => None,
                None => {
                    return Err(AddressError::InvalidPort {
                        address: trimmed.to_string(),
                        port: tail.to_string(),
                    })
                }
            };
            (host, port)
        } else {
            match trimmed.matches(':').count() {
                0 => (trimmed, None),
                1 => {
                    let (host, port) = trimmed.split_once(':').unwrap_or((trimmed, ""));
                    (host, Some(port))
                }
                // More than one colon without brackets is an IPv6 literal
                _ => (trimmed, None),
            }
        };

        if host.trim().is_empty() {
            return Err(AddressError::MissingHost(trimmed.to_string()));
        }

        let port = match port {
            None => DEFAULT_PORT,
            Some(port) => parse_port(trimmed, port)?,
        };

        Ok(Self::new(host.trim(), port))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

fn parse_port(address: &str, port: &str) -> Result<u16, AddressError> {
    match port.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(AddressError::InvalidPort {
            address: address.to_string(),
            port: port.to_string(),
        }),
    }
}

impl FromStr for CollectorAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CollectorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

//! Sender defaults
//!
//! Values used when neither a settings file nor the environment says
//! otherwise.

use std::time::Duration;

/// Collector trapper port appended to addresses given without one
pub const DEFAULT_PORT: u16 = 10051;

/// TCP connect timeout (milliseconds)
pub const CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Deadline for writing one request frame (milliseconds)
pub const WRITE_TIMEOUT_MS: u64 = 5_000;

/// Deadline for reading one response frame (milliseconds)
pub const READ_TIMEOUT_MS: u64 = 15_000;

/// Redirect hops followed before a send gives up
pub const MAX_REDIRECTS: usize = 3;

/// Whether a redirect target replaces the configured address it came from
pub const UPDATE_HOSTS: bool = false;

/// Largest response body accepted from a collector
pub const MAX_RESPONSE_SIZE: usize = 16 * 1024 * 1024; // 16MB

/// Prefix for environment overrides, e.g. `ZBX_MAX_REDIRECTS`
pub const ENV_PREFIX: &str = "ZBX";

pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(CONNECT_TIMEOUT_MS);
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(WRITE_TIMEOUT_MS);
pub const READ_TIMEOUT: Duration = Duration::from_millis(READ_TIMEOUT_MS);

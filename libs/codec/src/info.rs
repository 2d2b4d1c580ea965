//! Statistics carried in the info field of a successful data response
//!
//! The collector reports delivery results as free text:
//!
//! ```text
//! processed: 1; failed: 0; total: 1; seconds spent: 0.000030
//! ```
//!
//! Exactly four `;`-separated segments, each a single `key: value` pair.
//! Unknown keys are skipped so collectors may rename a field without breaking
//! the other three.

use std::str::FromStr;
use std::time::Duration;

use crate::error::InfoError;

const SEGMENT_COUNT: usize = 4;
const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Parsed delivery statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResponseInfo {
    pub processed: u64,
    pub failed: u64,
    pub total: u64,
    pub spent: Duration,
}

impl FromStr for ResponseInfo {
    type Err = InfoError;

    fn from_str(info: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = info.split(';').collect();
        if segments.len() != SEGMENT_COUNT {
            return Err(InfoError::parse(
                info,
                format!("expected {} segments, got {}", SEGMENT_COUNT, segments.len()),
            ));
        }

        let mut parsed = ResponseInfo::default();
        for segment in segments {
            let tokens: Vec<&str> = segment.split(':').collect();
            if tokens.len() != 2 {
                return Err(InfoError::parse(
                    info,
                    format!("expected 2 tokens in '{}', got {}", segment, tokens.len()),
                ));
            }

            let key = tokens[0].trim();
            let value = tokens[1].trim();
            match key {
                "processed" => parsed.processed = parse_count(info, key, value)?,
                "failed" => parsed.failed = parse_count(info, key, value)?,
                "total" => parsed.total = parse_count(info, key, value)?,
                "seconds spent" => parsed.spent = parse_seconds(info, value)?,
                _ => {}
            }
        }

        Ok(parsed)
    }
}

fn parse_count(info: &str, key: &str, value: &str) -> Result<u64, InfoError> {
    value
        .parse()
        .map_err(|e| InfoError::parse(info, format!("invalid {} value '{}': {}", key, value, e)))
}

// Truncates to whole nanoseconds.
fn parse_seconds(info: &str, value: &str) -> Result<Duration, InfoError> {
    let secs: f64 = value.parse().map_err(|e| {
        InfoError::parse(info, format!("invalid seconds spent value '{}': {}", value, e))
    })?;

    if !secs.is_finite() || secs < 0.0 {
        return Err(InfoError::parse(
            info,
            format!("seconds spent must be a finite non-negative number, got {}", value),
        ));
    }

    Ok(Duration::from_nanos((secs * NANOS_PER_SEC) as u64))
}

//! Metric records handed to the sender by callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::packet::RequestKind;

/// How a metric is delivered to the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeliveryMode {
    /// Emulates an active agent reporting its own items ("agent data")
    Active,
    /// Externally pushed trapper item ("sender data")
    #[default]
    Trapper,
}

impl DeliveryMode {
    /// Request kind a packet of this mode is sent as
    pub fn request_kind(self) -> RequestKind {
        match self {
            DeliveryMode::Active => RequestKind::AgentData,
            DeliveryMode::Trapper => RequestKind::SenderData,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryMode::Active => "active",
            DeliveryMode::Trapper => "trapper",
        }
    }
}

/// A single data point for one item of one monitored host
///
/// The delivery mode is not part of the wire format; it only decides which
/// packet the metric travels in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub host: String,
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub clock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ns: Option<u32>,
    #[serde(skip)]
    pub mode: DeliveryMode,
}

impl Metric {
    pub fn new(
        host: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        mode: DeliveryMode,
    ) -> Self {
        Self {
            host: host.into(),
            key: key.into(),
            value: value.into(),
            clock: None,
            ns: None,
            mode,
        }
    }

    /// Metric for an active agent item
    pub fn active(host: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(host, key, value, DeliveryMode::Active)
    }

    /// Metric for a trapper item
    pub fn trapper(host: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(host, key, value, DeliveryMode::Trapper)
    }

    /// Attach an explicit collection timestamp
    pub fn with_timestamp(self, at: DateTime<Utc>) -> Self {
        self.with_clock(at.timestamp(), at.timestamp_subsec_nanos())
    }

    /// Attach a timestamp as epoch seconds plus nanosecond remainder
    pub fn with_clock(mut self, secs: i64, nanos: u32) -> Self {
        self.clock = Some(secs);
        self.ns = Some(nanos);
        self
    }

    pub fn is_active(&self) -> bool {
        self.mode == DeliveryMode::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_metric_with_timestamp() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let metric = Metric::trapper("zabbixAgent1", "ping", "13").with_timestamp(at);

        assert_eq!(metric.clock, Some(1_700_000_000));
        assert_eq!(metric.ns, Some(123_456_789));
        assert!(!metric.is_active());
    }

    #[test]
    fn test_metric_json_omits_unset_clock_and_mode() {
        let metric = Metric::active("zabbixAgent1", "ping", "13");
        let json = serde_json::to_value(&metric).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"host": "zabbixAgent1", "key": "ping", "value": "13"})
        );
    }

    #[test]
    fn test_metric_json_includes_clock() {
        let metric = Metric::trapper("h", "k", "v").with_clock(42, 7);
        let json = serde_json::to_value(&metric).unwrap();

        assert_eq!(json["clock"], 42);
        assert_eq!(json["ns"], 7);
    }

    #[test]
    fn test_delivery_mode_request_kind() {
        assert_eq!(DeliveryMode::Active.request_kind(), RequestKind::AgentData);
        assert_eq!(DeliveryMode::Trapper.request_kind(), RequestKind::SenderData);
    }
}

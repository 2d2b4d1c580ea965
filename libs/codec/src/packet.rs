//! Request envelope sent to the collector

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{REQUEST_ACTIVE_CHECKS, REQUEST_AGENT_DATA, REQUEST_SENDER_DATA};
use crate::error::{ProtocolError, ProtocolResult};
use crate::metric::{DeliveryMode, Metric};

/// Value of the `request` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    #[serde(rename = "agent data")]
    AgentData,
    #[serde(rename = "sender data")]
    SenderData,
    #[serde(rename = "active checks")]
    ActiveChecks,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::AgentData => REQUEST_AGENT_DATA,
            RequestKind::SenderData => REQUEST_SENDER_DATA,
            RequestKind::ActiveChecks => REQUEST_ACTIVE_CHECKS,
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire-level request
///
/// Built fresh for every send. `host` and `host_metadata` are only set on
/// registration packets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub request: RequestKind,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub data: Vec<Metric>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub clock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ns: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub host_metadata: Option<String>,
}

impl Packet {
    /// Build a data packet for one delivery mode
    ///
    /// Every metric must carry `mode`; a mixed batch has to go through the
    /// sender's batch splitter instead.
    pub fn data(mode: DeliveryMode, metrics: Vec<Metric>) -> ProtocolResult<Self> {
        if let Some(stray) = metrics.iter().find(|m| m.mode != mode) {
            return Err(ProtocolError::ModeMismatch {
                host: stray.host.clone(),
                key: stray.key.clone(),
                expected: mode.as_str(),
                actual: stray.mode.as_str(),
            });
        }

        Ok(Self {
            request: mode.request_kind(),
            data: metrics,
            clock: None,
            ns: None,
            host: None,
            host_metadata: None,
        })
    }

    /// Build an "active checks" registration request
    pub fn registration(host: impl Into<String>, host_metadata: impl Into<String>) -> Self {
        let host_metadata = host_metadata.into();
        Self {
            request: RequestKind::ActiveChecks,
            data: Vec::new(),
            clock: None,
            ns: None,
            host: Some(host.into()),
            host_metadata: (!host_metadata.is_empty()).then_some(host_metadata),
        }
    }

    /// Stamp the whole batch with a send time
    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.clock = Some(at.timestamp());
        self.ns = Some(at.timestamp_subsec_nanos());
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// JSON body as sent on the wire
    pub fn to_json(&self) -> ProtocolResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::json("encoding packet", e))
    }
}

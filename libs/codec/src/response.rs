//! Collector reply model

use serde::{Deserialize, Serialize};

use crate::error::InfoError;
use crate::info::ResponseInfo;

/// Value of the `response` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Failed,
}

impl ResponseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseStatus::Success => "success",
            ResponseStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instruction to resend the same packet elsewhere (proxy group rebalancing)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub revision: i64,
    pub address: String,
}

/// Wire-level reply
///
/// Fields the sender does not use, such as the item list returned for
/// "active checks", are ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "response")]
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
}

impl Response {
    pub fn success(info: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            info: info.into(),
            redirect: None,
        }
    }

    pub fn failed(info: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            info: info.into(),
            redirect: None,
        }
    }

    /// Failed response pointing at another collector
    pub fn redirect(revision: i64, address: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            info: String::new(),
            redirect: Some(Redirect {
                revision,
                address: address.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Redirect descriptor worth acting on: present with a non-empty address
    pub fn usable_redirect(&self) -> Option<&Redirect> {
        self.redirect
            .as_ref()
            .filter(|r| !r.address.trim().is_empty())
    }

    /// Parse the info field into processed/failed/total/spent counters
    pub fn statistics(&self) -> Result<ResponseInfo, InfoError> {
        if !self.is_success() {
            return Err(InfoError::InvalidState {
                status: self.status.to_string(),
            });
        }
        self.info.parse()
    }
}

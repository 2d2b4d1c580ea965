//! Sender Configuration Module
//!
//! Loads sender settings from an optional TOML file with `ZBX_`-prefixed
//! environment overrides on top. Host entries may reference environment
//! variables (`${COLLECTOR}:10051`); they are expanded after loading.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::defaults;

/// Settings for one sender instance
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SenderSettings {
    /// Candidate collector addresses, tried in order
    pub hosts: Vec<String>,

    /// Redirect hops followed per starting address
    pub max_redirects: usize,

    /// Replace a configured address with the redirect target that accepted
    pub update_hosts: bool,

    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,

    /// Largest response body accepted (bytes)
    pub max_response_size: usize,
}

impl Default for SenderSettings {
    fn default() -> Self {
        Self {
            hosts: vec![format!("127.0.0.1:{}", defaults::DEFAULT_PORT)],
            max_redirects: defaults::MAX_REDIRECTS,
            update_hosts: defaults::UPDATE_HOSTS,
            connect_timeout_ms: defaults::CONNECT_TIMEOUT_MS,
            read_timeout_ms: defaults::READ_TIMEOUT_MS,
            write_timeout_ms: defaults::WRITE_TIMEOUT_MS,
            max_response_size: defaults::MAX_RESPONSE_SIZE,
        }
    }
}

impl SenderSettings {
    /// Settings for the given collectors with every other value defaulted
    pub fn for_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Load settings: defaults, then `path` (if given), then `ZBX_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, defaults::ENV_PREFIX)
    }

    pub(crate) fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading sender config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        // ZBX_HOSTS="a:10051,b" becomes a list; nested keys use a double underscore
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("hosts")
                .try_parsing(true),
        );

        let mut settings: SenderSettings = builder
            .build()
            .context("Failed to build sender configuration")?
            .try_deserialize()
            .context("Failed to deserialize sender configuration")?;

        settings.expand_env_vars()?;
        settings.validate()?;

        debug!(
            hosts = ?settings.hosts,
            max_redirects = settings.max_redirects,
            update_hosts = settings.update_hosts,
            "Sender configuration loaded"
        );
        Ok(settings)
    }

    /// Expand `$VAR` / `${VAR}` references in host entries
    pub fn expand_env_vars(&mut self) -> Result<()> {
        for host in &mut self.hosts {
            let expanded = shellexpand::env(host.as_str())
                .with_context(|| format!("Failed to expand host entry '{}'", host))?
                .trim()
                .to_string();
            *host = expanded;
        }
        Ok(())
    }

    /// Reject settings no sender could work with
    pub fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            bail!("At least one collector host must be configured");
        }
        if let Some(pos) = self.hosts.iter().position(|h| h.trim().is_empty()) {
            bail!("Collector host entry {} is empty", pos);
        }
        for (name, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("read_timeout_ms", self.read_timeout_ms),
            ("write_timeout_ms", self.write_timeout_ms),
        ] {
            if value == 0 {
                bail!("{} must be greater than zero", name);
            }
        }
        if self.max_response_size == 0 {
            bail!("max_response_size must be greater than zero");
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Effective settings rendered as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("Failed to render sender configuration")
    }
}

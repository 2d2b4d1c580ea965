//! # Sender Configuration
//!
//! Default constants and loadable settings for the collector sender.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use zbx_config::SenderSettings;
//!
//! // File values first, then ZBX_* environment overrides
//! let settings = SenderSettings::load(Some(Path::new("config/sender.toml")))?;
//! println!("collectors: {:?}", settings.hosts);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod sender_config;

pub use sender_config::SenderSettings;

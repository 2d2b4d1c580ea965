//! # Zabbix Sender Network Layer
//!
//! Delivers codec packets to Zabbix servers and proxies.
//!
//! - [`transports`]: one framed request/response exchange per TCP connection
//! - [`redirect`]: follows proxy-group redirects from one starting address
//! - [`sender`]: cached primary plus ordered host fallback, batch splitting
//!   by delivery mode and two-round host registration
//!
//! ```no_run
//! use zbx_codec::Metric;
//! use zbx_network::Sender;
//!
//! # async fn run() -> zbx_network::Result<()> {
//! let mut sender = Sender::with_hosts(["proxy-a:10051", "proxy-b"])?;
//! let outcome = sender
//!     .send_metrics(&[Metric::trapper("web-01", "orders.pending", "12")])
//!     .await;
//! if let Some(Ok(response)) = outcome.trapper {
//!     println!("{:?}", response.statistics());
//! }
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod error;
pub mod redirect;
pub mod sender;
pub mod transports;

#[cfg(test)]
mod testing;

pub use address::{AddressError, CollectorAddress};
pub use error::{HostFailure, IoPhase, Result, SenderError};
pub use redirect::{follow_redirects, Delivery};
pub use sender::{BatchOutcome, Sender};
pub use transports::{read_response_frame, TcpTransport, TcpTransportConfig, Transport};

//! # Zabbix Sender Protocol Codec
//!
//! ## Purpose
//!
//! The "rules" layer of the sender: what goes on the wire and how collector
//! replies are interpreted.
//! - Metric and packet model with per-mode consistency checks
//! - `ZBXD\x01` + u64 LE length + JSON framing
//! - Response model including proxy-group redirect descriptors
//! - Statistics parsing of the free-text info field
//!
//! ## What This Crate Does NOT Contain
//! - Sockets, timeouts or retries (belongs in zbx-network)
//! - Configuration loading (belongs in zbx-config)
//!
//! ## Architecture Role
//!
//! ```text
//! caller metrics → [codec: Packet → frame bytes] → network → collector
//!                  [codec: frame bytes → Response → ResponseInfo] ←
//! ```

pub mod constants;
pub mod error;
pub mod frame;
pub mod info;
pub mod metric;
pub mod packet;
pub mod response;

pub use constants::*;
pub use error::{InfoError, ProtocolError, ProtocolResult};
pub use frame::{decode_response, decode_response_body, encode_packet, encode_response, FrameHeader};
pub use info::ResponseInfo;
pub use metric::{DeliveryMode, Metric};
pub use packet::{Packet, RequestKind};
pub use response::{Redirect, Response, ResponseStatus};

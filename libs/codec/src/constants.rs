//! # Protocol Constants
//!
//! Wire-level values of the collector protocol. These must stay byte-for-byte
//! stable: collectors reject anything that does not start with [`HEADER`].

/// Protocol magic `ZBXD`
pub const PROTOCOL_MAGIC: [u8; 4] = *b"ZBXD";

/// Protocol version / flags byte (plain, uncompressed frame)
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Full 5-byte frame header: magic followed by the version byte
pub const HEADER: [u8; 5] = [b'Z', b'B', b'X', b'D', PROTOCOL_VERSION];

/// Size of the header in bytes
pub const HEADER_SIZE: usize = HEADER.len();

/// Size of the little-endian body length field
pub const LENGTH_FIELD_SIZE: usize = 8;

/// Header plus length field; the minimum size of any valid frame
pub const FRAME_PREFIX_SIZE: usize = HEADER_SIZE + LENGTH_FIELD_SIZE;

/// Wire tag for active agent emulation
pub const REQUEST_AGENT_DATA: &str = "agent data";

/// Wire tag for trapper items
pub const REQUEST_SENDER_DATA: &str = "sender data";

/// Wire tag for host registration
pub const REQUEST_ACTIVE_CHECKS: &str = "active checks";

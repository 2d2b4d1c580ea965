//! # Frame Codec
//!
//! Every exchange with a collector is one frame in each direction:
//!
//! ```text
//! +------+---------+----------------------+-----------+
//! | ZBXD | 0x01    | body length (u64 LE) | JSON body |
//! +------+---------+----------------------+-----------+
//!   4 B     1 B           8 B               length B
//! ```
//!
//! Encoding builds the frame in a single `BytesMut` so the transport can hand
//! it to the socket with one write. Decoding validates the header exactly;
//! compressed or large-packet flags are not supported and surface as
//! [`ProtocolError::InvalidHeader`].

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::constants::{FRAME_PREFIX_SIZE, HEADER, HEADER_SIZE};
use crate::error::{ProtocolError, ProtocolResult};
use crate::packet::Packet;
use crate::response::Response;

/// Decoded 13-byte frame prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Declared length of the JSON body
    pub body_len: u64,
}

impl FrameHeader {
    /// Parse the header and length field from the start of `data`
    pub fn parse(data: &[u8]) -> ProtocolResult<Self> {
        if data.len() < FRAME_PREFIX_SIZE {
            return Err(ProtocolError::message_too_small(
                FRAME_PREFIX_SIZE,
                data.len(),
                "frame header",
            ));
        }

        let header = &data[..HEADER_SIZE];
        if header != HEADER {
            return Err(ProtocolError::invalid_header(HEADER, header));
        }

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&data[HEADER_SIZE..FRAME_PREFIX_SIZE]);

        Ok(Self {
            body_len: u64::from_le_bytes(len_bytes),
        })
    }

    /// Reject declared lengths above `max`
    pub fn check_limit(&self, max: usize) -> ProtocolResult<usize> {
        match usize::try_from(self.body_len) {
            Ok(len) if len <= max => Ok(len),
            _ => Err(ProtocolError::MessageTooLarge {
                size: self.body_len,
                max,
            }),
        }
    }
}

fn encode_frame<T: Serialize>(value: &T, context: &'static str) -> ProtocolResult<Bytes> {
    let body = serde_json::to_vec(value).map_err(|e| ProtocolError::json(context, e))?;

    let mut buf = BytesMut::with_capacity(FRAME_PREFIX_SIZE + body.len());
    buf.put_slice(&HEADER);
    buf.put_u64_le(body.len() as u64);
    buf.put_slice(&body);

    Ok(buf.freeze())
}

/// Frame a request packet for the wire
pub fn encode_packet(packet: &Packet) -> ProtocolResult<Bytes> {
    encode_frame(packet, "encoding packet")
}

/// Frame a collector response; used by collector-side tooling and tests
pub fn encode_response(response: &Response) -> ProtocolResult<Bytes> {
    encode_frame(response, "encoding response")
}

/// Decode a JSON response body that has already been separated from its header
pub fn decode_response_body(body: &[u8]) -> ProtocolResult<Response> {
    serde_json::from_slice(body).map_err(|e| ProtocolError::json("decoding response", e))
}

/// Decode one complete response frame
///
/// The body must be exactly as long as the length field declares.
pub fn decode_response(data: &[u8]) -> ProtocolResult<Response> {
    let header = FrameHeader::parse(data)?;
    let body = &data[FRAME_PREFIX_SIZE..];

    let got = body.len() as u64;
    if got < header.body_len {
        return Err(ProtocolError::Truncated {
            declared: header.body_len,
            got: body.len(),
        });
    }
    if got > header.body_len {
        return Err(ProtocolError::TrailingBytes {
            declared: header.body_len,
            got: body.len(),
        });
    }

    decode_response_body(body)
}

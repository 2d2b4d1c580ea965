//! # Codec Integration Tests
//!
//! Exercises the public API the way the network crate and collector-side
//! tooling use it:
//! - Request frames match the documented byte layout
//! - Response frames decode into the model, statistics included
//! - Malformed input fails with a protocol error instead of panicking

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use zbx_codec::{
    decode_response, encode_packet, encode_response, DeliveryMode, FrameHeader, InfoError, Metric,
    Packet, ProtocolError, Response, ResponseStatus, FRAME_PREFIX_SIZE, HEADER,
};

fn body_of(frame: &[u8]) -> Value {
    let header = FrameHeader::parse(frame).unwrap();
    assert_eq!(header.body_len as usize, frame.len() - FRAME_PREFIX_SIZE);
    serde_json::from_slice(&frame[FRAME_PREFIX_SIZE..]).unwrap()
}

#[test]
fn test_agent_data_frame() {
    let at = Utc.timestamp_opt(1_700_000_100, 42).unwrap();
    let packet = Packet::data(
        DeliveryMode::Active,
        vec![
            Metric::active("zabbixAgent1", "ping", "13").with_timestamp(at),
            Metric::active("zabbixAgent1", "pong", "14"),
        ],
    )
    .unwrap()
    .with_timestamp(at);

    let frame = encode_packet(&packet).unwrap();
    assert_eq!(&frame[..5], &HEADER);

    assert_eq!(
        body_of(&frame),
        json!({
            "request": "agent data",
            "data": [
                {"host": "zabbixAgent1", "key": "ping", "value": "13", "clock": 1_700_000_100, "ns": 42},
                {"host": "zabbixAgent1", "key": "pong", "value": "14"}
            ],
            "clock": 1_700_000_100,
            "ns": 42
        })
    );
}

#[test]
fn test_registration_frame() {
    let frame = encode_packet(&Packet::registration("prueba", "prueba")).unwrap();

    assert_eq!(
        body_of(&frame),
        json!({"request": "active checks", "host": "prueba", "host_metadata": "prueba"})
    );
}

#[test]
fn test_collector_reply_statistics() {
    let frame = encode_response(&Response::success(
        "processed: 2; failed: 1; total: 3; seconds spent: 0.250000",
    ))
    .unwrap();

    let response = decode_response(&frame).unwrap();
    let info = response.statistics().unwrap();

    assert_eq!(info.processed, 2);
    assert_eq!(info.failed, 1);
    assert_eq!(info.total, 3);
    assert_eq!(info.spent.as_millis(), 250);
}

#[test]
fn test_failed_reply_has_no_statistics() {
    let frame = encode_response(&Response::failed("host [prueba] not found")).unwrap();
    let response = decode_response(&frame).unwrap();

    assert_eq!(response.status, ResponseStatus::Failed);
    assert!(matches!(
        response.statistics(),
        Err(InfoError::InvalidState { .. })
    ));
}

#[test]
fn test_malformed_frames() {
    for garbage in [&b""[..], b"Z", b"ZBX", b"ZBXD\x01\x05\x00"] {
        assert!(matches!(
            decode_response(garbage),
            Err(ProtocolError::MessageTooSmall { .. })
        ));
    }

    let mut wrong_magic = b"XBXD\x01".to_vec();
    wrong_magic.extend_from_slice(&2u64.to_le_bytes());
    wrong_magic.extend_from_slice(b"{}");
    assert!(matches!(
        decode_response(&wrong_magic),
        Err(ProtocolError::InvalidHeader { .. })
    ));
}

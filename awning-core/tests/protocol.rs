//! Codec behavior on the wire: framing, termination, starvation, and the
//! float payload encoding.

mod common;

use awning_core::protocol::{self, ErrorFlag, STOP_BYTE, bytes_to_float, float_to_bytes};
use common::ScriptedLink;

#[test]
fn float_conversion_is_bit_exact() {
    let samples: [[u8; 4]; 6] = [
        float_to_bytes(0.0),
        float_to_bytes(-0.0),
        float_to_bytes(12.5),
        float_to_bytes(650.0),
        float_to_bytes(f32::MAX),
        float_to_bytes(f32::MIN_POSITIVE),
    ];
    for bytes in samples {
        assert_eq!(float_to_bytes(bytes_to_float(bytes)), bytes);
    }
}

#[test]
fn quiet_line_yields_no_frame() {
    let mut link = ScriptedLink::default();
    assert!(protocol::receive(&mut link).is_none());
}

#[test]
fn write_frame_arrives_intact() {
    let payload = float_to_bytes(12.5);
    let mut link = ScriptedLink::with_bytes(&[
        0xA8, payload[0], payload[1], payload[2], payload[3], STOP_BYTE,
    ]);

    let frame = protocol::receive(&mut link).expect("frame present");
    assert!(frame.is_valid());
    assert_eq!(frame.opcode(), 0xA8);
    assert_eq!(frame.payload_value(), 12.5);
    assert!(link.rx.is_empty());
}

#[test]
fn read_request_consumes_opcode_and_terminator_only() {
    let mut link = ScriptedLink::with_bytes(&[0x08, STOP_BYTE, 0xDE, 0xAD]);

    let frame = protocol::receive(&mut link).expect("frame present");
    assert!(frame.is_valid());
    assert_eq!(frame.opcode(), 0x08);
    // Later traffic stays on the link untouched.
    assert_eq!(Vec::from(link.rx), vec![0xDE, 0xAD]);
}

#[test]
fn bad_terminator_flags_unexpected_byte_count() {
    // Read request whose second byte is not the stop marker.
    let mut link = ScriptedLink::with_bytes(&[0x08, 0x00, STOP_BYTE]);

    let frame = protocol::receive(&mut link).expect("frame present");
    assert_eq!(frame.error_flag(), Some(ErrorFlag::UnexpectedByteCount));
    // Decoding stopped immediately; the rest is not drained.
    assert_eq!(Vec::from(link.rx), vec![STOP_BYTE]);
}

#[test]
fn write_with_bad_terminator_flags_unexpected_byte_count() {
    let payload = float_to_bytes(1.0);
    let mut link = ScriptedLink::with_bytes(&[
        0xA8, payload[0], payload[1], payload[2], payload[3], 0x42,
    ]);

    let frame = protocol::receive(&mut link).expect("frame present");
    assert_eq!(frame.error_flag(), Some(ErrorFlag::UnexpectedByteCount));
}

#[test]
fn starved_write_exhausts_retry_budget() {
    // Opcode arrives, payload never follows.
    let mut link = ScriptedLink::with_bytes(&[0xA8, 0x11]);

    let frame = protocol::receive(&mut link).expect("frame present");
    assert_eq!(frame.error_flag(), Some(ErrorFlag::UnexpectedByteCount));
}

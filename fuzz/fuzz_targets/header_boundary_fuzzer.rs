//! Fuzz target for packet header boundary conditions.
//!
//! Prevent DoS attacks via malformed packet headers (HIGH priority).
//!
//! # Strategy
//!
//! - Magic bytes: valid, off-by-one, all-zeros, all-ones, random
//! - Payload length: zero, small, at-max, just-over-max, way-over-max, `u32::MAX`
//! - Packet type: every known variant plus unassigned values
//! - Sequence/client id: boundary values (0, 1, MAX)
//!
//! # Invariants
//!
//! - `payload_length` exceeding the type's max MUST return
//!   `ProtocolError::LengthExceeded`
//! - Invalid magic bytes MUST return `ProtocolError::MagicMismatch`
//! - An unassigned type field MUST return `ProtocolError::UnknownType`
//! - All decode errors MUST be structured (never panic)
//! - Encoded size MUST equal `PacketHeader::SIZE + payload.len()`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lumenwire_proto::{Packet, PacketHeader, PacketType};

const VALID_MAGIC: [u8; 4] = [0x4C, 0x57, 0x46, 0x52];

#[derive(Debug, Clone, Arbitrary)]
struct BoundaryHeader {
    magic: MagicBytes,
    packet_type: u16,
    payload_length: PayloadLength,
    sequence: SequenceValue,
    client_id: ClientIdValue,
}

#[derive(Debug, Clone, Arbitrary)]
enum MagicBytes {
    Valid,
    OffByOne(u8),
    AllZeros,
    AllOnes,
    Random([u8; 4]),
}

#[derive(Debug, Clone, Arbitrary)]
enum PayloadLength {
    Zero,
    Small(u8),
    AtMaxBoundary,
    JustOverMax,
    WayOverMax,
    MaxU32,
    Random(u32),
}

#[derive(Debug, Clone, Arbitrary)]
enum SequenceValue {
    Zero,
    One,
    MaxU32,
    Random(u32),
}

#[derive(Debug, Clone, Arbitrary)]
enum ClientIdValue {
    Zero,
    One,
    MaxU32,
    Random(u32),
}

const DEFAULT_MAX: u32 = lumenwire_proto::DEFAULT_MAX_PAYLOAD_SIZE;

fuzz_target!(|boundary: BoundaryHeader| {
    let payload_length = match boundary.payload_length {
        PayloadLength::Zero => 0,
        PayloadLength::Small(s) => u32::from(s),
        PayloadLength::AtMaxBoundary => DEFAULT_MAX,
        PayloadLength::JustOverMax => DEFAULT_MAX.saturating_add(1),
        PayloadLength::WayOverMax => DEFAULT_MAX.saturating_add(1_000_000),
        PayloadLength::MaxU32 => u32::MAX,
        PayloadLength::Random(r) => r,
    };
    let sequence = match boundary.sequence {
        SequenceValue::Zero => 0,
        SequenceValue::One => 1,
        SequenceValue::MaxU32 => u32::MAX,
        SequenceValue::Random(r) => r,
    };
    let client_id = match boundary.client_id {
        ClientIdValue::Zero => 0,
        ClientIdValue::One => 1,
        ClientIdValue::MaxU32 => u32::MAX,
        ClientIdValue::Random(r) => r,
    };

    // Cap the actual buffer so the fuzzer doesn't spend its time allocating
    // gigabytes for a `payload_length` that merely claims to be huge; the
    // header's declared length and the buffer's real length are allowed to
    // disagree, which is exactly the truncated-stream case the decoder must
    // reject cleanly.
    let actual_len = (payload_length as usize).min(64 * 1024);
    let mut buffer = vec![0u8; PacketHeader::SIZE + actual_len];

    match boundary.magic {
        MagicBytes::Valid => buffer[0..4].copy_from_slice(&VALID_MAGIC),
        MagicBytes::OffByOne(offset) => {
            buffer[0..4].copy_from_slice(&VALID_MAGIC);
            let idx = (offset % 4) as usize;
            buffer[idx] = buffer[idx].wrapping_add(1);
        },
        MagicBytes::AllZeros => buffer[0..4].fill(0),
        MagicBytes::AllOnes => buffer[0..4].fill(0xFF),
        MagicBytes::Random(bytes) => buffer[0..4].copy_from_slice(&bytes),
    }

    buffer[4..6].copy_from_slice(&boundary.packet_type.to_be_bytes());
    buffer[6..10].copy_from_slice(&payload_length.to_be_bytes());
    buffer[10..14].copy_from_slice(&sequence.to_be_bytes());
    // Leave the CRC32 field as zeros; a real payload hashing to zero is
    // astronomically unlikely, so almost every decode below should fail on
    // CRC before anything else once the header checks pass.
    buffer[18..22].copy_from_slice(&client_id.to_be_bytes());

    let _ = Packet::decode(&buffer);

    if let Some(packet_type) = PacketType::from_u16(boundary.packet_type) {
        let max = packet_type.max_payload_size();
        let payload = vec![0xAAu8; actual_len];
        let payload_len = payload.len();
        match Packet::new(packet_type, sequence, client_id, payload.into()) {
            Ok(packet) => {
                let encoded = packet.encode();
                assert_eq!(encoded.len(), PacketHeader::SIZE + packet.payload().len());

                let decoded =
                    Packet::decode(&encoded).expect("a packet we just encoded must decode");
                assert_eq!(decoded, packet);
            },
            Err(_) => assert!(payload_len as u64 > u64::from(max)),
        }
    }
});

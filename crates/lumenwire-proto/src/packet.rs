//! Framed packet: header plus payload, with streaming encode/decode.

use std::io::Read;

use bytes::Bytes;

use crate::errors::ProtocolError;
use crate::header::PacketHeader;
use crate::packet_type::PacketType;

/// A single framed packet: a [`PacketHeader`] and the payload bytes it
/// describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    header: PacketHeader,
    packet_type: PacketType,
    payload: Bytes,
}

impl Packet {
    /// Build a new packet, computing the header (including its CRC32) from
    /// `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::LengthExceeded`] if `payload` is longer
    /// than `packet_type`'s [`PacketType::max_payload_size`].
    pub fn new(
        packet_type: PacketType,
        sequence: u32,
        client_id: u32,
        payload: Bytes,
    ) -> Result<Self, ProtocolError> {
        let max = packet_type.max_payload_size();
        if payload.len() as u64 > u64::from(max) {
            return Err(ProtocolError::LengthExceeded {
                declared: payload.len() as u32,
                max,
            });
        }

        let header = PacketHeader::new(packet_type, sequence, client_id, &payload);
        Ok(Self {
            header,
            packet_type,
            payload,
        })
    }

    /// The packet's header.
    #[must_use]
    pub fn header(&self) -> &PacketHeader {
        &self.header
    }

    /// The packet's type.
    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    /// The packet's payload bytes.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Serialize this packet (header followed by payload) into a single
    /// contiguous buffer.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(PacketHeader::SIZE + self.payload.len());
        buf.extend_from_slice(&self.header.to_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Decode a single packet from an in-memory buffer.
    ///
    /// # Errors
    ///
    /// See [`Packet::decode_from`].
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut cursor = bytes;
        Self::decode_from(&mut cursor)
    }

    /// Decode a single packet by reading from `reader`: first the fixed
    /// header, then exactly `payload_length` bytes of payload. Uses
    /// `read_exact` for both reads so a reader that only has a partial
    /// packet buffered yields an I/O error the caller can retry on once
    /// more bytes arrive, rather than silently returning a short packet.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`]/[`ProtocolError::Io`] if the
    /// reader doesn't have enough bytes, [`ProtocolError::MagicMismatch`]
    /// or [`ProtocolError::UnknownType`] from header parsing,
    /// [`ProtocolError::LengthExceeded`] if the declared payload length
    /// exceeds the type's maximum, and [`ProtocolError::CrcMismatch`] if
    /// the payload's checksum doesn't match the header.
    pub fn decode_from<R: Read>(reader: &mut R) -> Result<Self, ProtocolError> {
        let mut header_bytes = [0u8; PacketHeader::SIZE];
        reader.read_exact(&mut header_bytes).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                ProtocolError::Truncated {
                    expected: PacketHeader::SIZE,
                    actual: 0,
                }
            } else {
                ProtocolError::from(err)
            }
        })?;

        let (header, packet_type) = PacketHeader::parse(&header_bytes)
            .inspect_err(|err| tracing::warn!(error = %err, "packet header rejected"))?;

        let declared_length = header.payload_length();
        let max = packet_type.max_payload_size();
        if declared_length > max {
            tracing::warn!(?packet_type, declared_length, max, "packet payload too large");
            return Err(ProtocolError::LengthExceeded {
                declared: declared_length,
                max,
            });
        }

        let mut payload = vec![0u8; declared_length as usize];
        reader.read_exact(&mut payload).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                ProtocolError::Truncated {
                    expected: declared_length as usize,
                    actual: 0,
                }
            } else {
                ProtocolError::from(err)
            }
        })?;

        let computed = crc32fast::hash(&payload);
        let declared_crc = header.crc32();
        if computed != declared_crc {
            tracing::warn!(declared_crc, computed, "packet payload failed checksum");
            return Err(ProtocolError::CrcMismatch {
                declared: declared_crc,
                computed,
            });
        }

        Ok(Self {
            header,
            packet_type,
            payload: Bytes::from(payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let packet = Packet::new(PacketType::Ping, 42, 7, Bytes::from_static(b"hello")).unwrap();
        let encoded = packet.encode();
        let decoded = Packet::decode(&encoded).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn rejects_oversized_payload() {
        let huge = vec![0u8; (PacketType::Ping.max_payload_size() + 1) as usize];
        let err = Packet::new(PacketType::Ping, 1, 1, Bytes::from(huge)).unwrap_err();
        assert!(matches!(err, ProtocolError::LengthExceeded { .. }));
    }

    #[test]
    fn rejects_truncated_stream() {
        let packet = Packet::new(PacketType::Ping, 1, 1, Bytes::from_static(b"hi")).unwrap();
        let mut encoded = packet.encode();
        encoded.truncate(encoded.len() - 1);
        let err = Packet::decode(&encoded).unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { .. }));
    }

    #[test]
    fn single_bit_flip_in_payload_is_rejected() {
        let packet =
            Packet::new(PacketType::Ping, 1, 1, Bytes::from_static(b"flip me")).unwrap();
        let mut encoded = packet.encode();
        let last = encoded.len() - 1;
        encoded[last] ^= 0x01;
        let err = Packet::decode(&encoded).unwrap_err();
        assert!(matches!(err, ProtocolError::CrcMismatch { .. }));
    }

    proptest! {
        #[test]
        fn round_trips_arbitrary_payloads(
            sequence in any::<u32>(),
            client_id in any::<u32>(),
            payload in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let packet = Packet::new(PacketType::EncryptedData, sequence, client_id, Bytes::from(payload)).unwrap();
            let encoded = packet.encode();
            let decoded = Packet::decode(&encoded).unwrap();
            prop_assert_eq!(decoded, packet);
        }
    }
}

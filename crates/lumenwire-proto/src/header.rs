//! Fixed-layout packet header.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::ProtocolError;
use crate::packet_type::PacketType;

/// Default cap on a payload's declared length, used for packet types that
/// don't specify a tighter one of their own (see
/// [`PacketType::max_payload_size`]).
pub const DEFAULT_MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// On-wire packet header.
///
/// Six big-endian fields: magic(4) + type(2) + payload length(4) +
/// sequence(4) + CRC32(4) + client id(4), for a total of
/// [`PacketHeader::SIZE`] bytes. All multi-byte fields are stored as raw
/// byte arrays rather than native integers so the layout is identical on
/// every platform regardless of host endianness; accessors convert via
/// `from_be_bytes`/`to_be_bytes` at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct PacketHeader {
    magic: [u8; 4],
    packet_type: [u8; 2],
    payload_length: [u8; 4],
    sequence: [u8; 4],
    crc32: [u8; 4],
    client_id: [u8; 4],
}

impl PacketHeader {
    /// Magic constant identifying a lumenwire packet header.
    pub const MAGIC: u32 = 0x4C57_4652; // "LWFR"

    /// Size in bytes of the encoded header.
    pub const SIZE: usize = 22;

    /// Build a new header, computing the CRC32 over `payload` internally.
    #[must_use]
    pub fn new(
        packet_type: PacketType,
        sequence: u32,
        client_id: u32,
        payload: &[u8],
    ) -> Self {
        let crc = crc32fast::hash(payload);
        Self {
            magic: Self::MAGIC.to_be_bytes(),
            packet_type: packet_type.to_u16().to_be_bytes(),
            payload_length: (payload.len() as u32).to_be_bytes(),
            sequence: sequence.to_be_bytes(),
            crc32: crc.to_be_bytes(),
            client_id: client_id.to_be_bytes(),
        }
    }

    /// Parse a header from exactly [`PacketHeader::SIZE`] bytes, validating
    /// the magic and packet type but not the payload length bound (callers
    /// pick that bound per [`PacketType::max_payload_size`] after learning
    /// which type this is) nor the CRC (verified once the payload itself
    /// has been read).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if `bytes` is shorter than
    /// [`PacketHeader::SIZE`], [`ProtocolError::MagicMismatch`] if the
    /// magic doesn't match, or [`ProtocolError::UnknownType`] if the type
    /// field isn't a recognised [`PacketType`].
    pub fn parse(bytes: &[u8]) -> Result<(Self, PacketType), ProtocolError> {
        if bytes.len() < Self::SIZE {
            return Err(ProtocolError::Truncated {
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }

        let Ok(header) = Self::read_from_bytes(&bytes[..Self::SIZE]) else {
            unreachable!("slice length was checked against PacketHeader::SIZE above");
        };

        let magic = header.magic();
        if magic != Self::MAGIC {
            return Err(ProtocolError::MagicMismatch {
                expected: Self::MAGIC,
                actual: magic,
            });
        }

        let raw_type = u16::from_be_bytes(header.packet_type);
        let packet_type = PacketType::from_u16(raw_type)
            .ok_or(ProtocolError::UnknownType(raw_type))?;

        Ok((header, packet_type))
    }

    /// Serialize this header to its on-wire byte representation.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let Ok(bytes) = self.as_bytes().try_into() else {
            unreachable!("PacketHeader::as_bytes always yields PacketHeader::SIZE bytes");
        };
        bytes
    }

    /// The magic constant as read from the wire.
    #[must_use]
    pub fn magic(&self) -> u32 {
        u32::from_be_bytes(self.magic)
    }

    /// Declared payload length in bytes.
    #[must_use]
    pub fn payload_length(&self) -> u32 {
        u32::from_be_bytes(self.payload_length)
    }

    /// Monotonically increasing per-sender sequence number.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        u32::from_be_bytes(self.sequence)
    }

    /// CRC32 of the payload, as declared by the sender.
    #[must_use]
    pub fn crc32(&self) -> u32 {
        u32::from_be_bytes(self.crc32)
    }

    /// Identifier of the client that sent this packet.
    #[must_use]
    pub fn client_id(&self) -> u32 {
        u32::from_be_bytes(self.client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_short_buffer() {
        let err = PacketHeader::parse(&[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::Truncated {
                expected: PacketHeader::SIZE,
                actual: 10
            }
        );
    }

    #[test]
    fn rejects_bad_magic() {
        let header = PacketHeader::new(PacketType::Ping, 1, 7, b"");
        let mut bytes = header.to_bytes();
        bytes[0] ^= 0xFF;
        let err = PacketHeader::parse(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::MagicMismatch { .. }));
    }

    #[test]
    fn rejects_unknown_type() {
        let header = PacketHeader::new(PacketType::Ping, 1, 7, b"");
        let mut bytes = header.to_bytes();
        // Byte offset 4..6 is the type field; 0xFFFF is unassigned.
        bytes[4] = 0xFF;
        bytes[5] = 0xFF;
        let err = PacketHeader::parse(&bytes).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownType(0xFFFF));
    }

    proptest! {
        #[test]
        fn round_trips_through_bytes(
            sequence in any::<u32>(),
            client_id in any::<u32>(),
            payload in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let header = PacketHeader::new(PacketType::AsciiFrame, sequence, client_id, &payload);
            let bytes = header.to_bytes();
            let (parsed, parsed_type) = PacketHeader::parse(&bytes).unwrap();

            prop_assert_eq!(parsed, header);
            prop_assert_eq!(parsed_type, PacketType::AsciiFrame);
            prop_assert_eq!(parsed.sequence(), sequence);
            prop_assert_eq!(parsed.client_id(), client_id);
            prop_assert_eq!(parsed.payload_length() as usize, payload.len());
            prop_assert_eq!(parsed.crc32(), crc32fast::hash(&payload));
        }
    }
}

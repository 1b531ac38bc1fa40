//! The finite set of typed payloads a packet header can declare.

/// Wire-level packet type, carried in [`crate::header::PacketHeader::packet_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PacketType {
    /// Rendered ANSI-art frame, with its own 24-byte sub-header (`spec.md` §3).
    AsciiFrame = 0x0001,
    /// Raw image frame (pre-render), opaque to the framer.
    ImageFrame = 0x0002,
    /// Keepalive request.
    Ping = 0x0003,
    /// Keepalive response.
    Pong = 0x0004,
    /// Handshake phase 1: version exchange.
    ProtocolVersion = 0x0010,
    /// Handshake phase 2a: client capability advertisement.
    CryptoCapabilities = 0x0011,
    /// Handshake phase 2b: server algorithm selection.
    CryptoParameters = 0x0012,
    /// Handshake phase 3: initiator's ephemeral public key.
    KeyExchangeInit = 0x0013,
    /// Handshake phase 3: responder's ephemeral public key.
    KeyExchangeResponse = 0x0014,
    /// Handshake phase 4: authentication nonce challenge.
    AuthChallenge = 0x0015,
    /// Handshake phase 4: signed challenge response.
    AuthResponse = 0x0016,
    /// Handshake phase 5: either side signals the session is ready.
    HandshakeComplete = 0x0017,
    /// Post-handshake AEAD-protected payload.
    EncryptedData = 0x0018,
    /// Graceful session teardown.
    Goodbye = 0x0020,
    /// Either side aborts with a textual reason.
    Error = 0x0021,
}

impl PacketType {
    /// Decode a wire-format `u16` into a known packet type.
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0x0001 => Self::AsciiFrame,
            0x0002 => Self::ImageFrame,
            0x0003 => Self::Ping,
            0x0004 => Self::Pong,
            0x0010 => Self::ProtocolVersion,
            0x0011 => Self::CryptoCapabilities,
            0x0012 => Self::CryptoParameters,
            0x0013 => Self::KeyExchangeInit,
            0x0014 => Self::KeyExchangeResponse,
            0x0015 => Self::AuthChallenge,
            0x0016 => Self::AuthResponse,
            0x0017 => Self::HandshakeComplete,
            0x0018 => Self::EncryptedData,
            0x0020 => Self::Goodbye,
            0x0021 => Self::Error,
            _ => return None,
        })
    }

    /// Encode to the wire-format `u16`.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Per-type maximum payload size. All types share the global default
    /// (16 MiB) except `AsciiFrame`/`ImageFrame`, which may legitimately
    /// approach it, and the small fixed-size handshake messages, which are
    /// capped far tighter so a malicious peer cannot claim a multi-megabyte
    /// `AuthChallenge`.
    #[must_use]
    pub const fn max_payload_size(self) -> u32 {
        match self {
            Self::Ping
            | Self::Pong
            | Self::HandshakeComplete
            | Self::Goodbye
            | Self::ProtocolVersion
            | Self::CryptoCapabilities
            | Self::CryptoParameters
            | Self::KeyExchangeInit
            | Self::KeyExchangeResponse
            | Self::AuthChallenge
            | Self::AuthResponse => 4096,
            Self::Error => 64 * 1024,
            Self::AsciiFrame | Self::ImageFrame | Self::EncryptedData => {
                crate::header::DEFAULT_MAX_PAYLOAD_SIZE
            },
        }
    }
}

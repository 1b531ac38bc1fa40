//! Error types for the packet framer.

use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding a [`crate::Packet`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The 4-byte magic at the start of a header did not match
    /// [`crate::header::PacketHeader::MAGIC`].
    #[error("magic mismatch: expected {expected:#010x}, got {actual:#010x}")]
    MagicMismatch {
        /// Expected magic constant.
        expected: u32,
        /// Magic actually read from the wire.
        actual: u32,
    },

    /// The header declared a payload length exceeding the configured
    /// per-type maximum.
    #[error("payload length {declared} exceeds maximum {max}")]
    LengthExceeded {
        /// Length the header declared.
        declared: u32,
        /// Maximum permitted for this decode call.
        max: u32,
    },

    /// Fewer bytes were available than the header or payload required.
    #[error("truncated: expected at least {expected} bytes, read {actual}")]
    Truncated {
        /// Bytes required to complete the read.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// The payload's CRC32 did not match the header's declared checksum.
    #[error("CRC mismatch: header declared {declared:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// Checksum read from the header.
        declared: u32,
        /// Checksum computed over the payload actually read.
        computed: u32,
    },

    /// The header's type field did not correspond to a known
    /// [`crate::PacketType`].
    #[error("unknown packet type {0:#06x}")]
    UnknownType(u16),

    /// Underlying I/O failure while reading from the transport.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

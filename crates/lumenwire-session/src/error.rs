//! Errors surfaced while driving a handshake or an established encrypted
//! session.

use std::time::Duration;

use lumenwire_core::{ErrorKind, HasErrorKind};
use lumenwire_crypto::CryptoError;
use lumenwire_proto::ProtocolError;
use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised by [`crate::handshake::HandshakeContext`] and
/// [`crate::session::EncryptedSession`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A packet was malformed, arrived for the wrong state, or carried a
    /// payload that failed to decode.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The client and server capability masks shared no algorithm in some
    /// class.
    #[error("no common algorithm for {class}")]
    NoCommonAlgorithm {
        /// Algorithm class with no overlap (`"key exchange"`,
        /// `"authentication"` or `"cipher"`).
        class: &'static str,
    },

    /// A cryptographic operation failed: key exchange, signature
    /// verification, or AEAD encrypt/decrypt.
    #[error("cryptographic failure: {0}")]
    Crypto(#[from] CryptoError),

    /// The handshake's configured deadline elapsed before reaching `Ready`.
    #[error("handshake timed out after {elapsed:?}")]
    Timeout {
        /// How long the handshake had been running when the deadline hit.
        elapsed: Duration,
    },

    /// The cooperative cancellation flag was observed at a phase boundary.
    #[error("handshake cancelled")]
    Cancelled,

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Network(String),

    /// A decrypted packet's sequence number did not match the receiver's
    /// expected next value.
    #[error("sequence violation: expected {expected}, got {actual}")]
    SequenceViolation {
        /// Sequence number the receiver required next.
        expected: u32,
        /// Sequence number the packet actually carried.
        actual: u32,
    },
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl HasErrorKind for SessionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol(_) | Self::NoCommonAlgorithm { .. } | Self::SequenceViolation { .. } => {
                ErrorKind::Protocol
            },
            Self::Crypto(err) => err.kind(),
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Network(_) => ErrorKind::Network,
        }
    }
}

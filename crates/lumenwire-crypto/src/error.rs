//! Error types for key exchange, identity verification and the session
//! cipher.

use lumenwire_core::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors raised by key exchange, signing/verification or the AEAD session
/// cipher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A signature did not verify against the claimed public key.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// A public key or signature had the wrong byte length for its
    /// algorithm.
    #[error("malformed key material: expected {expected} bytes, got {actual}")]
    MalformedKeyMaterial {
        /// Expected byte length.
        expected: usize,
        /// Byte length actually supplied.
        actual: usize,
    },

    /// AEAD decryption failed: either the tag didn't match or the
    /// associated data was tampered with.
    #[error("AEAD authentication failed")]
    DecryptionFailed,

    /// A per-direction nonce counter reached the point where continuing
    /// would risk nonce reuse; the session must rekey or terminate.
    #[error("nonce counter exhausted at {counter}, rekey required")]
    NonceCounterExhausted {
        /// Counter value at which the limit was reached.
        counter: u64,
    },

    /// A peer's known-hosts entry didn't match the key it presented.
    #[error("host key mismatch for {host}")]
    HostKeyMismatch {
        /// Host the mismatch was detected for.
        host: String,
    },

    /// HKDF expansion was asked for more output than the algorithm
    /// supports for the given PRK.
    #[error("key derivation failed: {reason}")]
    KeyDerivationFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl HasErrorKind for CryptoError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::SignatureInvalid | Self::HostKeyMismatch { .. } => ErrorKind::AuthRejected,
            Self::MalformedKeyMaterial { .. }
            | Self::DecryptionFailed
            | Self::KeyDerivationFailed { .. } => ErrorKind::Protocol,
            Self::NonceCounterExhausted { .. } => ErrorKind::Resource,
        }
    }
}

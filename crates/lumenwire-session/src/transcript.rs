//! Running hash of every handshake payload processed, in order, by either
//! side. Both peers accumulate the identical byte sequence when the
//! handshake proceeds without tampering, so the resulting digest is usable
//! as a channel-binding input to key derivation and to the authentication
//! phase's signed messages.

use sha2::{Digest, Sha256};

/// Accumulates handshake payload bytes into a running SHA-256 state.
#[derive(Clone, Default)]
pub struct Transcript {
    hasher: Sha256,
}

impl Transcript {
    /// An empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` (a sent or received payload) to the transcript.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// The current digest, without consuming the accumulator — later
    /// messages can still be appended and hashed from this point.
    #[must_use]
    pub fn hash(&self) -> [u8; 32] {
        self.hasher.clone().finalize().into()
    }
}

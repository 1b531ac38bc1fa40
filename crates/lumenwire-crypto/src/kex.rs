//! Ephemeral X25519 key exchange.

use x25519_dalek::{EphemeralSecret, PublicKey, SharedSecret};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Byte length of an X25519 public key.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// An ephemeral key-exchange keypair, consumed exactly once by
/// [`EphemeralKeyPair::diffie_hellman`].
pub struct EphemeralKeyPair {
    secret: EphemeralSecret,
    public: PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a fresh ephemeral keypair using the supplied randomness
    /// source.
    #[must_use]
    pub fn generate(random_bytes: impl FnOnce(&mut [u8])) -> Self {
        let mut seed = [0u8; 32];
        random_bytes(&mut seed);
        let secret = EphemeralSecret::random_from_rng(SeedRng::new(seed));
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// This side's public key, to be sent to the peer in a
    /// `KeyExchangeInit`/`KeyExchangeResponse` packet.
    #[must_use]
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public.to_bytes()
    }

    /// Consume this keypair and the peer's public key to produce the raw
    /// Diffie-Hellman shared secret. The secret is not yet suitable as a
    /// session key; pass it to [`crate::kdf::derive_session_keys`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedKeyMaterial`] if `peer_public_key`
    /// isn't exactly [`EphemeralKeyPair::PUBLIC_KEY_SIZE`] bytes, or
    /// propagates an all-zero shared secret (the `x25519-dalek` contract
    /// output for the identity-adjacent low-order points) as
    /// [`CryptoError::MalformedKeyMaterial`] since accepting it would hand
    /// the peer a predictable session key.
    pub fn diffie_hellman(self, peer_public_key: &[u8]) -> Result<SharedSecret, CryptoError> {
        let bytes: [u8; PUBLIC_KEY_SIZE] =
            peer_public_key
                .try_into()
                .map_err(|_| CryptoError::MalformedKeyMaterial {
                    expected: PUBLIC_KEY_SIZE,
                    actual: peer_public_key.len(),
                })?;
        let peer_public = PublicKey::from(bytes);
        let shared = self.secret.diffie_hellman(&peer_public);

        if shared.was_contributory() {
            Ok(shared)
        } else {
            Err(CryptoError::MalformedKeyMaterial {
                expected: PUBLIC_KEY_SIZE,
                actual: PUBLIC_KEY_SIZE,
            })
        }
    }
}

/// A `rand_core`-compatible RNG that deterministically expands a seed,
/// letting [`EphemeralKeyPair::generate`] take a plain `FnOnce(&mut [u8])`
/// (matching `lumenwire_core::Environment::random_bytes`) instead of
/// depending on a specific RNG type at the call site.
struct SeedRng {
    state: [u8; 32],
    counter: u64,
}

impl SeedRng {
    fn new(seed: [u8; 32]) -> Self {
        Self { state: seed, counter: 0 }
    }
}

impl rand_core::RngCore for SeedRng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        use sha2::{Digest, Sha256};

        for chunk in dest.chunks_mut(32) {
            let mut hasher = Sha256::new();
            hasher.update(self.state);
            hasher.update(self.counter.to_le_bytes());
            self.counter = self.counter.wrapping_add(1);
            let digest = hasher.finalize();
            chunk.copy_from_slice(&digest[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl rand_core::CryptoRng for SeedRng {}

impl Drop for SeedRng {
    fn drop(&mut self) {
        self.state.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair(fill: u8) -> EphemeralKeyPair {
        EphemeralKeyPair::generate(|buf| buf.fill(fill))
    }

    #[test]
    fn both_sides_derive_the_same_shared_secret() {
        let alice = keypair(0xA1);
        let bob = keypair(0xB2);

        let alice_public = alice.public_key();
        let bob_public = bob.public_key();

        let alice_shared = alice.diffie_hellman(&bob_public).unwrap();
        let bob_shared = bob.diffie_hellman(&alice_public).unwrap();

        assert_eq!(alice_shared.as_bytes(), bob_shared.as_bytes());
    }

    #[test]
    fn rejects_short_peer_key() {
        let alice = keypair(0x01);
        let err = alice.diffie_hellman(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedKeyMaterial { .. }));
    }

    #[test]
    fn different_seeds_produce_different_public_keys() {
        let alice = keypair(0x11);
        let bob = keypair(0x22);
        assert_ne!(alice.public_key(), bob.public_key());
    }
}

//! AEAD session cipher with independent, non-reusable per-direction nonce
//! counters.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305, XNonce};
use zeroize::Zeroize;

use crate::algorithms::CipherAlgorithm;
use crate::error::CryptoError;

/// Counter value at which a rekey becomes mandatory (spec: "on approach to
/// 2^63 a rekey is mandatory"). Crossing it is treated as fatal rather than
/// silently wrapping.
pub const REKEY_THRESHOLD: u64 = 1 << 63;

enum AeadImpl {
    XChaCha20Poly1305(Box<XChaCha20Poly1305>),
    ChaCha20Poly1305(Box<ChaCha20Poly1305>),
}

/// A per-direction nonce: a random prefix fixed for the life of the
/// session, concatenated with a monotonically increasing 64-bit counter.
struct NonceCounter {
    prefix: Vec<u8>,
    counter: u64,
}

impl NonceCounter {
    fn new(prefix: Vec<u8>) -> Self {
        Self { prefix, counter: 0 }
    }

    /// Build the nonce for the current counter value without advancing it.
    fn current(&self) -> Vec<u8> {
        let mut nonce = self.prefix.clone();
        nonce.extend_from_slice(&self.counter.to_be_bytes());
        nonce
    }

    /// Advance past the current counter value, failing if doing so would
    /// cross [`REKEY_THRESHOLD`].
    fn advance(&mut self) -> Result<(), CryptoError> {
        if self.counter >= REKEY_THRESHOLD {
            return Err(CryptoError::NonceCounterExhausted {
                counter: self.counter,
            });
        }
        self.counter += 1;
        Ok(())
    }
}

impl Drop for NonceCounter {
    fn drop(&mut self) {
        self.prefix.zeroize();
    }
}

/// Keys and counters for one direction of an AEAD session.
struct DirectionState {
    aead: AeadImpl,
    nonce: NonceCounter,
}

/// A bidirectional encrypted session: independent send and receive AEAD
/// states, each with its own nonce counter, matching the negotiated
/// [`CipherAlgorithm`].
pub struct SessionCipher {
    send: DirectionState,
    receive: DirectionState,
}

impl SessionCipher {
    /// Build a session cipher from already-derived per-direction keys (see
    /// [`crate::kdf::derive_session_keys`]).
    #[must_use]
    pub fn new(
        cipher: CipherAlgorithm,
        send_key: &[u8; 32],
        send_nonce_prefix: Vec<u8>,
        receive_key: &[u8; 32],
        receive_nonce_prefix: Vec<u8>,
    ) -> Self {
        Self {
            send: DirectionState {
                aead: build_aead(cipher, send_key),
                nonce: NonceCounter::new(send_nonce_prefix),
            },
            receive: DirectionState {
                aead: build_aead(cipher, receive_key),
                nonce: NonceCounter::new(receive_nonce_prefix),
            },
        }
    }

    /// Encrypt `plaintext` under the send direction's next nonce, binding
    /// `associated_data` (the packet type, sequence number and client
    /// identifier, per the wire contract) into the authentication tag.
    ///
    /// Returns the nonce used (to place in the `EncryptedData` payload) and
    /// the ciphertext with its trailing authentication tag.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NonceCounterExhausted`] if the send counter
    /// has reached [`REKEY_THRESHOLD`]; the session must rekey before
    /// sending further data.
    pub fn encrypt(
        &mut self,
        plaintext: &[u8],
        associated_data: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
        let nonce = self.send.nonce.current();
        let ciphertext = encrypt_with(&self.send.aead, &nonce, plaintext, associated_data)?;
        self.send.nonce.advance()?;
        Ok((nonce, ciphertext))
    }

    /// Decrypt a received `EncryptedData` payload. `nonce` must equal the
    /// receive direction's current expected nonce; this enforces the
    /// "never reused, never out of order" nonce discipline independent of
    /// whatever sequence-number check the caller also performs at the
    /// framer level.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptionFailed`] if `nonce` doesn't match
    /// the expected counter or the AEAD tag doesn't verify, and
    /// [`CryptoError::NonceCounterExhausted`] if the receive counter has
    /// reached [`REKEY_THRESHOLD`].
    pub fn decrypt(
        &mut self,
        nonce: &[u8],
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let expected_nonce = self.receive.nonce.current();
        if nonce != expected_nonce.as_slice() {
            return Err(CryptoError::DecryptionFailed);
        }

        let plaintext = decrypt_with(&self.receive.aead, nonce, ciphertext, associated_data)?;
        self.receive.nonce.advance()?;
        Ok(plaintext)
    }
}

fn build_aead(cipher: CipherAlgorithm, key: &[u8; 32]) -> AeadImpl {
    match cipher {
        CipherAlgorithm::XChaCha20Poly1305 => {
            AeadImpl::XChaCha20Poly1305(Box::new(XChaCha20Poly1305::new(key.into())))
        },
        CipherAlgorithm::ChaCha20Poly1305 => {
            AeadImpl::ChaCha20Poly1305(Box::new(ChaCha20Poly1305::new(key.into())))
        },
    }
}

fn encrypt_with(
    aead: &AeadImpl,
    nonce: &[u8],
    plaintext: &[u8],
    associated_data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let payload = Payload {
        msg: plaintext,
        aad: associated_data,
    };
    match aead {
        AeadImpl::XChaCha20Poly1305(cipher) => cipher
            .encrypt(XNonce::from_slice(nonce), payload)
            .map_err(|_| CryptoError::DecryptionFailed),
        AeadImpl::ChaCha20Poly1305(cipher) => cipher
            .encrypt(chacha20poly1305::Nonce::from_slice(nonce), payload)
            .map_err(|_| CryptoError::DecryptionFailed),
    }
}

fn decrypt_with(
    aead: &AeadImpl,
    nonce: &[u8],
    ciphertext: &[u8],
    associated_data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let payload = Payload {
        msg: ciphertext,
        aad: associated_data,
    };
    match aead {
        AeadImpl::XChaCha20Poly1305(cipher) => cipher
            .decrypt(XNonce::from_slice(nonce), payload)
            .map_err(|_| CryptoError::DecryptionFailed),
        AeadImpl::ChaCha20Poly1305(cipher) => cipher
            .decrypt(chacha20poly1305::Nonce::from_slice(nonce), payload)
            .map_err(|_| CryptoError::DecryptionFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paired_ciphers(cipher: CipherAlgorithm) -> (SessionCipher, SessionCipher) {
        let a_to_b_key = [0x11u8; 32];
        let b_to_a_key = [0x22u8; 32];
        let prefix_len = (cipher.nonce_size() as usize) - 8;

        let alice = SessionCipher::new(
            cipher,
            &a_to_b_key,
            vec![0xAA; prefix_len],
            &b_to_a_key,
            vec![0xBB; prefix_len],
        );
        let bob = SessionCipher::new(
            cipher,
            &b_to_a_key,
            vec![0xBB; prefix_len],
            &a_to_b_key,
            vec![0xAA; prefix_len],
        );
        (alice, bob)
    }

    #[test]
    fn round_trips_xchacha20() {
        let (mut alice, mut bob) = paired_ciphers(CipherAlgorithm::XChaCha20Poly1305);
        let aad = b"type=EncryptedData,seq=1,client=7";

        let (nonce, ciphertext) = alice.encrypt(b"hello bob", aad).unwrap();
        let plaintext = bob.decrypt(&nonce, &ciphertext, aad).unwrap();

        assert_eq!(plaintext, b"hello bob");
    }

    #[test]
    fn round_trips_chacha20() {
        let (mut alice, mut bob) = paired_ciphers(CipherAlgorithm::ChaCha20Poly1305);
        let aad = b"aad";

        let (nonce, ciphertext) = alice.encrypt(b"short nonce cipher", aad).unwrap();
        let plaintext = bob.decrypt(&nonce, &ciphertext, aad).unwrap();

        assert_eq!(plaintext, b"short nonce cipher");
    }

    #[test]
    fn tampered_associated_data_is_rejected() {
        let (mut alice, mut bob) = paired_ciphers(CipherAlgorithm::XChaCha20Poly1305);

        let (nonce, ciphertext) = alice.encrypt(b"payload", b"aad-v1").unwrap();
        let result = bob.decrypt(&nonce, &ciphertext, b"aad-v2");

        assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn out_of_order_nonce_is_rejected() {
        let (mut alice, mut bob) = paired_ciphers(CipherAlgorithm::XChaCha20Poly1305);

        let (_first_nonce, _first_ct) = alice.encrypt(b"one", b"aad").unwrap();
        let (second_nonce, second_ct) = alice.encrypt(b"two", b"aad").unwrap();

        // Bob still expects counter 0; presenting counter 1's packet first
        // must fail even though the tag itself would verify against the
        // matching key.
        let result = bob.decrypt(&second_nonce, &second_ct, b"aad");
        assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn sequential_messages_round_trip_in_order() {
        let (mut alice, mut bob) = paired_ciphers(CipherAlgorithm::XChaCha20Poly1305);

        for i in 0..5u32 {
            let message = format!("message {i}");
            let (nonce, ciphertext) = alice.encrypt(message.as_bytes(), b"aad").unwrap();
            let plaintext = bob.decrypt(&nonce, &ciphertext, b"aad").unwrap();
            assert_eq!(plaintext, message.as_bytes());
        }
    }

    #[test]
    fn nonce_counter_rejects_exhaustion() {
        let mut counter = NonceCounter::new(vec![0u8; 16]);
        counter.counter = REKEY_THRESHOLD;
        let err = counter.advance().unwrap_err();
        assert_eq!(err, CryptoError::NonceCounterExhausted { counter: REKEY_THRESHOLD });
    }
}

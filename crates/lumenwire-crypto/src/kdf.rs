//! Session key derivation from a completed key exchange.

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::SharedSecret;
use zeroize::Zeroize;

use crate::algorithms::CipherAlgorithm;
use crate::error::CryptoError;

const SESSION_LABEL: &[u8] = b"lumenwireSessionV1";
const CLIENT_TO_SERVER_CONTEXT: &[u8] = b"c2s";
const SERVER_TO_CLIENT_CONTEXT: &[u8] = b"s2c";
const NONCE_PREFIX_CONTEXT: &[u8] = b"nonce-prefix";

/// Symmetric key material for one direction of an encrypted session:
/// an AEAD key and the random nonce prefix prepended to that direction's
/// monotonic counter.
pub struct DirectionalKeys {
    key: [u8; 32],
    nonce_prefix: Vec<u8>,
}

impl DirectionalKeys {
    /// The AEAD key for this direction.
    #[must_use]
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    /// The random nonce prefix for this direction. Its length is
    /// `cipher.nonce_size() - 8` (the remaining bytes are the monotonic
    /// counter).
    #[must_use]
    pub fn nonce_prefix(&self) -> &[u8] {
        &self.nonce_prefix
    }
}

impl Drop for DirectionalKeys {
    fn drop(&mut self) {
        self.key.zeroize();
        self.nonce_prefix.zeroize();
    }
}

/// Both directions' keys, derived once from the shared secret and the
/// handshake transcript hash.
pub struct SessionKeys {
    /// Keys for packets this side sends.
    pub send: DirectionalKeys,
    /// Keys for packets this side receives.
    pub receive: DirectionalKeys,
}

/// Derive both directions' session keys from a Diffie-Hellman shared
/// secret and the transcript hash accumulated over the handshake so far.
///
/// Nonce prefixes are derived here (rather than exchanged as a separate
/// wire message) so that "chosen at handshake time" in the nonce-discipline
/// contract is satisfied without growing the message catalogue: both sides
/// compute the same prefixes independently once they hold the same shared
/// secret and transcript hash.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivationFailed`] if HKDF expansion is asked
/// for an output length it cannot produce (unreachable for the fixed sizes
/// used here, but surfaced rather than panicking).
pub fn derive_session_keys(
    shared_secret: &SharedSecret,
    transcript_hash: &[u8],
    cipher: CipherAlgorithm,
    is_client: bool,
) -> Result<SessionKeys, CryptoError> {
    let hkdf = Hkdf::<Sha256>::new(Some(transcript_hash), shared_secret.as_bytes());

    let client_to_server = derive_directional(&hkdf, CLIENT_TO_SERVER_CONTEXT, cipher)?;
    let server_to_client = derive_directional(&hkdf, SERVER_TO_CLIENT_CONTEXT, cipher)?;

    Ok(if is_client {
        SessionKeys {
            send: client_to_server,
            receive: server_to_client,
        }
    } else {
        SessionKeys {
            send: server_to_client,
            receive: client_to_server,
        }
    })
}

fn derive_directional(
    hkdf: &Hkdf<Sha256>,
    direction_context: &[u8],
    cipher: CipherAlgorithm,
) -> Result<DirectionalKeys, CryptoError> {
    let mut key = [0u8; 32];
    let key_info = labeled_info(direction_context, b"key");
    hkdf.expand(&key_info, &mut key)
        .map_err(|_| CryptoError::KeyDerivationFailed {
            reason: "32-byte AEAD key expansion failed".to_string(),
        })?;

    let prefix_len = (cipher.nonce_size() as usize).saturating_sub(8);
    let mut nonce_prefix = vec![0u8; prefix_len];
    let prefix_info = labeled_info(direction_context, NONCE_PREFIX_CONTEXT);
    hkdf.expand(&prefix_info, &mut nonce_prefix)
        .map_err(|_| CryptoError::KeyDerivationFailed {
            reason: "nonce prefix expansion failed".to_string(),
        })?;

    Ok(DirectionalKeys { key, nonce_prefix })
}

fn labeled_info(direction_context: &[u8], purpose: &[u8]) -> Vec<u8> {
    let mut info = Vec::with_capacity(SESSION_LABEL.len() + direction_context.len() + purpose.len() + 2);
    info.extend_from_slice(SESSION_LABEL);
    info.push(0);
    info.extend_from_slice(direction_context);
    info.push(0);
    info.extend_from_slice(purpose);
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kex::EphemeralKeyPair;

    fn shared_secret() -> SharedSecret {
        let alice = EphemeralKeyPair::generate(|buf| buf.fill(0x11));
        let bob = EphemeralKeyPair::generate(|buf| buf.fill(0x22));
        let bob_public = bob.public_key();
        alice.diffie_hellman(&bob_public).unwrap()
    }

    #[test]
    fn client_send_key_matches_server_receive_key() {
        let secret = shared_secret();
        let transcript = b"transcript-hash-placeholder";

        let client = derive_session_keys(&secret, transcript, CipherAlgorithm::XChaCha20Poly1305, true).unwrap();
        let server = derive_session_keys(&secret, transcript, CipherAlgorithm::XChaCha20Poly1305, false).unwrap();

        assert_eq!(client.send.key(), server.receive.key());
        assert_eq!(client.receive.key(), server.send.key());
        assert_eq!(client.send.nonce_prefix(), server.receive.nonce_prefix());
    }

    #[test]
    fn send_and_receive_keys_differ() {
        let secret = shared_secret();
        let keys = derive_session_keys(&secret, b"transcript", CipherAlgorithm::ChaCha20Poly1305, true).unwrap();
        assert_ne!(keys.send.key(), keys.receive.key());
    }

    #[test]
    fn nonce_prefix_length_matches_cipher() {
        let secret = shared_secret();
        let keys = derive_session_keys(&secret, b"transcript", CipherAlgorithm::ChaCha20Poly1305, true).unwrap();
        assert_eq!(keys.send.nonce_prefix().len(), 4); // 12-byte nonce - 8-byte counter
    }

    #[test]
    fn different_transcripts_produce_different_keys() {
        let secret = shared_secret();
        let a = derive_session_keys(&secret, b"transcript-a", CipherAlgorithm::XChaCha20Poly1305, true).unwrap();
        let b = derive_session_keys(&secret, b"transcript-b", CipherAlgorithm::XChaCha20Poly1305, true).unwrap();
        assert_ne!(a.send.key(), b.send.key());
    }
}

//! Identity-key abstraction used by the authentication phase of the
//! handshake.
//!
//! The handshake only ever calls [`IdentityKey::sign`] and
//! [`IdentityKey::public_key`]; it never inspects how a key is backed. Three
//! backings are provided, matching the three kinds the authentication phase
//! must support:
//!
//! - [`InMemoryIdentity`] — the private key lives in process memory.
//! - [`AgentIdentity`] — signing is delegated to an external agent behind
//!   [`SigningAgent`]; the private key never enters this process.
//! - [`OpenSshIdentity`] — backed by an Ed25519 seed already extracted from
//!   an OpenSSH private-key file. Parsing the OpenSSH container format
//!   itself is config/file-format plumbing out of scope for this crate;
//!   callers hand us the decoded seed.
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Byte length of an Ed25519 public key.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Byte length of an Ed25519 signature.
pub const SIGNATURE_SIZE: usize = 64;

/// Something that can sign a message and reveal its public key, without the
/// handshake needing to know where the private key lives.
pub trait IdentityKey {
    /// Sign `message`, returning a raw Ed25519 signature.
    fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE];

    /// This identity's public key.
    fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE];
}

/// Verify a signature against a claimed public key.
///
/// # Errors
///
/// Returns [`CryptoError::MalformedKeyMaterial`] if `public_key` or
/// `signature` have the wrong length, or [`CryptoError::SignatureInvalid`]
/// if the signature doesn't verify.
pub fn verify_signature(
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let public_key: [u8; PUBLIC_KEY_SIZE] =
        public_key
            .try_into()
            .map_err(|_| CryptoError::MalformedKeyMaterial {
                expected: PUBLIC_KEY_SIZE,
                actual: public_key.len(),
            })?;
    let signature: [u8; SIGNATURE_SIZE] =
        signature
            .try_into()
            .map_err(|_| CryptoError::MalformedKeyMaterial {
                expected: SIGNATURE_SIZE,
                actual: signature.len(),
            })?;

    let verifying_key = VerifyingKey::from_bytes(&public_key)
        .map_err(|_| CryptoError::MalformedKeyMaterial { expected: PUBLIC_KEY_SIZE, actual: PUBLIC_KEY_SIZE })?;
    let signature = Signature::from_bytes(&signature);

    verifying_key.verify(message, &signature).map_err(|_| {
        tracing::warn!("signature verification failed");
        CryptoError::SignatureInvalid
    })
}

/// An Ed25519 private key held directly in process memory.
pub struct InMemoryIdentity {
    signing_key: SigningKey,
}

impl InMemoryIdentity {
    /// Build from a raw 32-byte Ed25519 seed.
    #[must_use]
    pub fn from_seed(mut seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        Self { signing_key }
    }

    /// Generate a fresh identity using the supplied randomness source.
    #[must_use]
    pub fn generate(random_bytes: impl FnOnce(&mut [u8])) -> Self {
        let mut seed = [0u8; 32];
        random_bytes(&mut seed);
        Self::from_seed(seed)
    }
}

impl IdentityKey for InMemoryIdentity {
    fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.signing_key.sign(message).to_bytes()
    }

    fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.signing_key.verifying_key().to_bytes()
    }
}

/// A handle to an external process or device that holds a private key and
/// performs signing on the caller's behalf. Implementations never return
/// the private key itself.
pub trait SigningAgent: Send + Sync {
    /// Ask the agent to sign `message`.
    fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE];

    /// Ask the agent for the public key it is signing with.
    fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE];
}

/// Identity backed by a [`SigningAgent`]; the private key never enters this
/// process.
pub struct AgentIdentity {
    agent: Box<dyn SigningAgent>,
}

impl AgentIdentity {
    /// Wrap an agent handle.
    #[must_use]
    pub fn new(agent: Box<dyn SigningAgent>) -> Self {
        Self { agent }
    }
}

impl IdentityKey for AgentIdentity {
    fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.agent.sign(message)
    }

    fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.agent.public_key()
    }
}

/// Identity derived from an Ed25519 seed already extracted from an OpenSSH
/// private-key file by the caller. This type does not parse the OpenSSH
/// container format; it only wraps the decoded seed with the same signing
/// behavior as [`InMemoryIdentity`].
pub struct OpenSshIdentity {
    inner: InMemoryIdentity,
}

impl OpenSshIdentity {
    /// Wrap a seed already decoded from an OpenSSH Ed25519 private key.
    #[must_use]
    pub fn from_decoded_seed(seed: [u8; 32]) -> Self {
        Self {
            inner: InMemoryIdentity::from_seed(seed),
        }
    }
}

impl IdentityKey for OpenSshIdentity {
    fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.inner.sign(message)
    }

    fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.inner.public_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_identity_signs_verifiably() {
        let identity = InMemoryIdentity::from_seed([7u8; 32]);
        let message = b"transcript || nonce";
        let signature = identity.sign(message);

        verify_signature(&identity.public_key(), message, &signature).unwrap();
    }

    #[test]
    fn tampered_message_fails_verification() {
        let identity = InMemoryIdentity::from_seed([9u8; 32]);
        let signature = identity.sign(b"original");

        let result = verify_signature(&identity.public_key(), b"tampered", &signature);
        assert_eq!(result, Err(CryptoError::SignatureInvalid));
    }

    #[test]
    fn wrong_public_key_fails_verification() {
        let identity = InMemoryIdentity::from_seed([1u8; 32]);
        let other = InMemoryIdentity::from_seed([2u8; 32]);
        let message = b"hello";
        let signature = identity.sign(message);

        let result = verify_signature(&other.public_key(), message, &signature);
        assert_eq!(result, Err(CryptoError::SignatureInvalid));
    }

    #[test]
    fn malformed_key_length_is_rejected() {
        let result = verify_signature(&[0u8; 4], b"hello", &[0u8; SIGNATURE_SIZE]);
        assert!(matches!(result, Err(CryptoError::MalformedKeyMaterial { .. })));
    }

    struct StubAgent {
        inner: InMemoryIdentity,
    }

    impl SigningAgent for StubAgent {
        fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
            self.inner.sign(message)
        }

        fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
            self.inner.public_key()
        }
    }

    #[test]
    fn agent_identity_delegates_to_handle() {
        let identity = AgentIdentity::new(Box::new(StubAgent {
            inner: InMemoryIdentity::from_seed([3u8; 32]),
        }));
        let message = b"agent signed";
        let signature = identity.sign(message);
        verify_signature(&identity.public_key(), message, &signature).unwrap();
    }

    #[test]
    fn openssh_identity_signs_like_in_memory() {
        let identity = OpenSshIdentity::from_decoded_seed([5u8; 32]);
        let message = b"openssh backed";
        let signature = identity.sign(message);
        verify_signature(&identity.public_key(), message, &signature).unwrap();
    }
}

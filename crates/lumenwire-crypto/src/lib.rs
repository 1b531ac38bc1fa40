//! Cryptographic primitives for lumenwire's session protocol.
//!
//! Pure building blocks with deterministic outputs wherever the input is
//! deterministic; callers (in `lumenwire-session`) provide random bytes
//! through [`lumenwire_core::Environment`] rather than this crate reaching
//! for a global RNG, so handshakes replay identically under simulation.
//!
//! # Key lifecycle
//!
//! ```text
//! Ephemeral X25519 keypairs (per side)
//!        │
//!        ▼
//! Diffie-Hellman → raw shared secret
//!        │
//!        ▼
//! HKDF-SHA256(transcript hash) → per-direction AEAD key + nonce prefix
//!        │
//!        ▼
//! SessionCipher (AEAD + monotonic nonce counter) → ciphertext
//! ```
//!
//! Authentication, when negotiated, is a side channel off this diagram: an
//! [`identity::IdentityKey`] signs `transcript || nonce` and the peer
//! verifies it with [`identity::verify_signature`]; it does not feed the
//! session key derivation.
//!
//! # Security
//!
//! Forward secrecy:
//! - Ephemeral keypairs are generated fresh per handshake and never
//!   persisted; the shared secret dies with the session.
//! - Session keys are zeroized on drop ([`kdf::DirectionalKeys`]).
//!
//! Nonce discipline:
//! - Send and receive directions hold independent counters
//!   ([`session_cipher::SessionCipher`]); a counter is never reused and a
//!   decrypt is refused outright if the presented nonce doesn't match the
//!   expected next value.
//! - Crossing [`session_cipher::REKEY_THRESHOLD`] is a hard error rather
//!   than a silent wrap.
//!
//! Authenticity:
//! - AEAD tags bind plaintext to the packet's type, sequence number and
//!   client identifier via associated data, so header tampering invalidates
//!   the tag even if the ciphertext itself is untouched.
//! - Host-identity pinning ([`known_hosts`]) detects a swapped server key
//!   across sessions; only [`known_hosts::INSECURE_NO_HOST_IDENTITY_CHECK_VAR`]
//!   disables it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithms;
mod error;
pub mod identity;
pub mod kdf;
pub mod kex;
pub mod known_hosts;
pub mod session_cipher;

pub use algorithms::{AuthAlgorithm, CipherAlgorithm, KexAlgorithm};
pub use error::{CryptoError, Result};
pub use identity::{AgentIdentity, IdentityKey, InMemoryIdentity, OpenSshIdentity, SigningAgent};
pub use kdf::{DirectionalKeys, SessionKeys, derive_session_keys};
pub use kex::EphemeralKeyPair;
pub use known_hosts::KnownHosts;
pub use session_cipher::SessionCipher;

//! Fixed-layout payload structs carried inside handshake packets.
//!
//! These are raw big-endian binary layouts, not CBOR: the handshake is a
//! small, closed set of fixed-shape messages, so there is nothing a
//! self-describing encoding buys over reading fields at known offsets.
//! Structs whose size is knowable without external context
//! ([`ProtocolVersion`], [`CryptoCapabilities`], [`CryptoParameters`],
//! [`AuthChallenge`]) are laid out with `zerocopy`, matching
//! [`crate::header::PacketHeader`]. Structs whose size depends on an
//! algorithm selection already negotiated in [`CryptoParameters`]
//! ([`KeyExchangeMessage`], [`AuthResponse`], [`EncryptedData`]) are framed
//! by hand against caller-supplied sizes instead.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::ProtocolError;

/// Handshake phase 1: advertises the sender's protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct ProtocolVersion {
    version: [u8; 2],
    revision: [u8; 2],
    supports_encryption: u8,
    reserved: u8,
}

impl ProtocolVersion {
    /// Size in bytes of the encoded payload.
    pub const SIZE: usize = 6;

    /// Build a new version announcement.
    #[must_use]
    pub fn new(version: u16, revision: u16, supports_encryption: bool) -> Self {
        Self {
            version: version.to_be_bytes(),
            revision: revision.to_be_bytes(),
            supports_encryption: u8::from(supports_encryption),
            reserved: 0,
        }
    }

    /// Protocol version the sender supports.
    #[must_use]
    pub fn version(&self) -> u16 {
        u16::from_be_bytes(self.version)
    }

    /// Protocol revision within `version`.
    #[must_use]
    pub fn revision(&self) -> u16 {
        u16::from_be_bytes(self.revision)
    }

    /// Whether the sender can participate in the encrypted session phase.
    #[must_use]
    pub fn supports_encryption(&self) -> bool {
        self.supports_encryption != 0
    }

    /// Parse from an exact-size byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if `bytes` is shorter than
    /// [`ProtocolVersion::SIZE`].
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        parse_fixed(bytes, Self::SIZE)
    }

    /// Serialize to the on-wire byte representation.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        to_fixed_bytes(self)
    }
}

/// Handshake phase 2a: the client's supported algorithm sets, one bit per
/// algorithm within each mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct CryptoCapabilities {
    kex_mask: [u8; 2],
    auth_mask: [u8; 2],
    cipher_mask: [u8; 2],
}

impl CryptoCapabilities {
    /// Size in bytes of the encoded payload.
    pub const SIZE: usize = 6;

    /// Build a new capability announcement.
    #[must_use]
    pub fn new(kex_mask: u16, auth_mask: u16, cipher_mask: u16) -> Self {
        Self {
            kex_mask: kex_mask.to_be_bytes(),
            auth_mask: auth_mask.to_be_bytes(),
            cipher_mask: cipher_mask.to_be_bytes(),
        }
    }

    /// Bitmask of key-exchange algorithms the sender supports.
    #[must_use]
    pub fn kex_mask(&self) -> u16 {
        u16::from_be_bytes(self.kex_mask)
    }

    /// Bitmask of authentication algorithms the sender supports.
    #[must_use]
    pub fn auth_mask(&self) -> u16 {
        u16::from_be_bytes(self.auth_mask)
    }

    /// Bitmask of AEAD ciphers the sender supports.
    #[must_use]
    pub fn cipher_mask(&self) -> u16 {
        u16::from_be_bytes(self.cipher_mask)
    }

    /// Parse from an exact-size byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if `bytes` is shorter than
    /// [`CryptoCapabilities::SIZE`].
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        parse_fixed(bytes, Self::SIZE)
    }

    /// Serialize to the on-wire byte representation.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        to_fixed_bytes(self)
    }
}

/// Handshake phase 2b: the server's chosen algorithms and the field sizes
/// that follow from them, so both sides can frame every later message
/// without re-negotiating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct CryptoParameters {
    selected_kex: u8,
    selected_auth: u8,
    selected_cipher: u8,
    verification_enabled: u8,
    kex_public_key_size: [u8; 2],
    auth_public_key_size: [u8; 2],
    signature_size: [u8; 2],
    shared_secret_size: [u8; 2],
    nonce_size: [u8; 2],
    mac_size: [u8; 2],
    hmac_size: [u8; 2],
}

impl CryptoParameters {
    /// Size in bytes of the encoded payload.
    pub const SIZE: usize = 18;

    /// Build a new parameter set.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        selected_kex: u8,
        selected_auth: u8,
        selected_cipher: u8,
        verification_enabled: bool,
        kex_public_key_size: u16,
        auth_public_key_size: u16,
        signature_size: u16,
        shared_secret_size: u16,
        nonce_size: u16,
        mac_size: u16,
        hmac_size: u16,
    ) -> Self {
        Self {
            selected_kex,
            selected_auth,
            selected_cipher,
            verification_enabled: u8::from(verification_enabled),
            kex_public_key_size: kex_public_key_size.to_be_bytes(),
            auth_public_key_size: auth_public_key_size.to_be_bytes(),
            signature_size: signature_size.to_be_bytes(),
            shared_secret_size: shared_secret_size.to_be_bytes(),
            nonce_size: nonce_size.to_be_bytes(),
            mac_size: mac_size.to_be_bytes(),
            hmac_size: hmac_size.to_be_bytes(),
        }
    }

    /// Enum id of the chosen key-exchange algorithm.
    #[must_use]
    pub fn selected_kex(&self) -> u8 {
        self.selected_kex
    }

    /// Enum id of the chosen authentication algorithm.
    #[must_use]
    pub fn selected_auth(&self) -> u8 {
        self.selected_auth
    }

    /// Enum id of the chosen AEAD cipher.
    #[must_use]
    pub fn selected_cipher(&self) -> u8 {
        self.selected_cipher
    }

    /// Whether mutual authentication is required this session.
    #[must_use]
    pub fn verification_enabled(&self) -> bool {
        self.verification_enabled != 0
    }

    /// Byte length of a key-exchange public key.
    #[must_use]
    pub fn kex_public_key_size(&self) -> u16 {
        u16::from_be_bytes(self.kex_public_key_size)
    }

    /// Byte length of an identity public key.
    #[must_use]
    pub fn auth_public_key_size(&self) -> u16 {
        u16::from_be_bytes(self.auth_public_key_size)
    }

    /// Byte length of a signature.
    #[must_use]
    pub fn signature_size(&self) -> u16 {
        u16::from_be_bytes(self.signature_size)
    }

    /// Byte length of the key-exchange shared secret.
    #[must_use]
    pub fn shared_secret_size(&self) -> u16 {
        u16::from_be_bytes(self.shared_secret_size)
    }

    /// Byte length of an AEAD nonce.
    #[must_use]
    pub fn nonce_size(&self) -> u16 {
        u16::from_be_bytes(self.nonce_size)
    }

    /// Byte length of an AEAD authentication tag.
    #[must_use]
    pub fn mac_size(&self) -> u16 {
        u16::from_be_bytes(self.mac_size)
    }

    /// Byte length of an HMAC tag used during key confirmation.
    #[must_use]
    pub fn hmac_size(&self) -> u16 {
        u16::from_be_bytes(self.hmac_size)
    }

    /// Parse from an exact-size byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if `bytes` is shorter than
    /// [`CryptoParameters::SIZE`].
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        parse_fixed(bytes, Self::SIZE)
    }

    /// Serialize to the on-wire byte representation.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        to_fixed_bytes(self)
    }
}

/// Handshake phase 3: an ephemeral key-exchange public key. Carried in both
/// `KeyExchangeInit` and `KeyExchangeResponse` packets; the direction is
/// implied by the packet type, not by this payload's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExchangeMessage {
    public_key: Vec<u8>,
}

impl KeyExchangeMessage {
    /// Wrap a raw public key.
    #[must_use]
    pub fn new(public_key: Vec<u8>) -> Self {
        Self { public_key }
    }

    /// The raw public key bytes.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Parse a public key of exactly `kex_public_key_size` bytes (from the
    /// negotiated [`CryptoParameters`]).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if `bytes` is shorter than
    /// `kex_public_key_size`.
    pub fn parse(bytes: &[u8], kex_public_key_size: u16) -> Result<Self, ProtocolError> {
        let expected = kex_public_key_size as usize;
        if bytes.len() < expected {
            return Err(ProtocolError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self::new(bytes[..expected].to_vec()))
    }

    /// Serialize to the on-wire byte representation.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.public_key.clone()
    }
}

/// Handshake phase 4: a random nonce the peer must sign to prove identity
/// key possession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct AuthChallenge {
    nonce: [u8; 32],
}

impl AuthChallenge {
    /// Size in bytes of the encoded payload.
    pub const SIZE: usize = 32;

    /// Build a challenge around a caller-supplied random nonce.
    #[must_use]
    pub fn new(nonce: [u8; 32]) -> Self {
        Self { nonce }
    }

    /// The challenge nonce.
    #[must_use]
    pub fn nonce(&self) -> [u8; 32] {
        self.nonce
    }

    /// Parse from an exact-size byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if `bytes` is shorter than
    /// [`AuthChallenge::SIZE`].
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        parse_fixed(bytes, Self::SIZE)
    }

    /// Serialize to the on-wire byte representation.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        to_fixed_bytes(self)
    }
}

/// Handshake phase 4: a signature over the challenge (concatenated with the
/// transcript hash) plus the identity public key that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    signature: Vec<u8>,
    public_key: Vec<u8>,
}

impl AuthResponse {
    /// Build a new response.
    #[must_use]
    pub fn new(signature: Vec<u8>, public_key: Vec<u8>) -> Self {
        Self {
            signature,
            public_key,
        }
    }

    /// The signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The signer's identity public key.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Parse `signature ‖ public_key`, with lengths taken from the
    /// negotiated [`CryptoParameters`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if `bytes` is shorter than
    /// `signature_size + auth_public_key_size`.
    pub fn parse(
        bytes: &[u8],
        signature_size: u16,
        auth_public_key_size: u16,
    ) -> Result<Self, ProtocolError> {
        let signature_size = signature_size as usize;
        let auth_public_key_size = auth_public_key_size as usize;
        let expected = signature_size + auth_public_key_size;
        if bytes.len() < expected {
            return Err(ProtocolError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self::new(
            bytes[..signature_size].to_vec(),
            bytes[signature_size..expected].to_vec(),
        ))
    }

    /// Serialize to the on-wire byte representation.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.signature.len() + self.public_key.len());
        buf.extend_from_slice(&self.signature);
        buf.extend_from_slice(&self.public_key);
        buf
    }
}

/// Handshake phase 5: an empty payload signaling readiness to switch to the
/// encrypted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandshakeComplete;

impl HandshakeComplete {
    /// Parse the (empty) payload. Accepts a non-empty slice so a verbose
    /// peer's trailing padding doesn't fail the handshake; only the prefix
    /// is meaningful.
    #[must_use]
    pub fn parse(_bytes: &[u8]) -> Self {
        Self
    }

    /// Serialize to the on-wire byte representation (always empty).
    #[must_use]
    pub fn to_bytes(self) -> [u8; 0] {
        []
    }
}

/// Post-handshake AEAD-protected payload: `nonce ‖ ciphertext ‖ tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData {
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

impl EncryptedData {
    /// Build a new encrypted envelope.
    #[must_use]
    pub fn new(nonce: Vec<u8>, ciphertext: Vec<u8>, tag: Vec<u8>) -> Self {
        Self {
            nonce,
            ciphertext,
            tag,
        }
    }

    /// The nonce used for this message.
    #[must_use]
    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    /// The encrypted ciphertext.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// The AEAD authentication tag.
    #[must_use]
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    /// Parse `nonce ‖ ciphertext ‖ tag`, with `nonce_size` and `mac_size`
    /// taken from the negotiated [`CryptoParameters`]; everything between
    /// them is ciphertext.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if `bytes` is shorter than
    /// `nonce_size + mac_size`.
    pub fn parse(bytes: &[u8], nonce_size: u16, mac_size: u16) -> Result<Self, ProtocolError> {
        let nonce_size = nonce_size as usize;
        let mac_size = mac_size as usize;
        let minimum = nonce_size + mac_size;
        if bytes.len() < minimum {
            return Err(ProtocolError::Truncated {
                expected: minimum,
                actual: bytes.len(),
            });
        }
        let ciphertext_end = bytes.len() - mac_size;
        Ok(Self::new(
            bytes[..nonce_size].to_vec(),
            bytes[nonce_size..ciphertext_end].to_vec(),
            bytes[ciphertext_end..].to_vec(),
        ))
    }

    /// Serialize to the on-wire byte representation.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(self.nonce.len() + self.ciphertext.len() + self.tag.len());
        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(&self.ciphertext);
        buf.extend_from_slice(&self.tag);
        buf
    }
}

fn parse_fixed<T>(bytes: &[u8], size: usize) -> Result<T, ProtocolError>
where
    T: FromBytes + KnownLayout + Immutable,
{
    if bytes.len() < size {
        return Err(ProtocolError::Truncated {
            expected: size,
            actual: bytes.len(),
        });
    }
    let Ok(value) = T::read_from_bytes(&bytes[..size]) else {
        unreachable!("slice length was checked against size above");
    };
    Ok(value)
}

fn to_fixed_bytes<T, const N: usize>(value: T) -> [u8; N]
where
    T: IntoBytes + Immutable,
{
    let Ok(bytes) = value.as_bytes().try_into() else {
        unreachable!("caller-supplied N must match T's encoded size");
    };
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_version_round_trips() {
        let value = ProtocolVersion::new(7, 3, true);
        let bytes = value.to_bytes();
        assert_eq!(bytes.len(), ProtocolVersion::SIZE);
        let parsed = ProtocolVersion::parse(&bytes).unwrap();
        assert_eq!(parsed, value);
        assert_eq!(parsed.version(), 7);
        assert_eq!(parsed.revision(), 3);
        assert!(parsed.supports_encryption());
    }

    #[test]
    fn crypto_capabilities_round_trips() {
        let value = CryptoCapabilities::new(0b0011, 0b0101, 0b1001);
        let parsed = CryptoCapabilities::parse(&value.to_bytes()).unwrap();
        assert_eq!(parsed.kex_mask(), 0b0011);
        assert_eq!(parsed.auth_mask(), 0b0101);
        assert_eq!(parsed.cipher_mask(), 0b1001);
    }

    #[test]
    fn crypto_parameters_round_trips() {
        let value = CryptoParameters::new(1, 1, 1, true, 32, 32, 64, 32, 24, 16, 32);
        let bytes = value.to_bytes();
        assert_eq!(bytes.len(), CryptoParameters::SIZE);
        let parsed = CryptoParameters::parse(&bytes).unwrap();
        assert_eq!(parsed, value);
        assert!(parsed.verification_enabled());
        assert_eq!(parsed.nonce_size(), 24);
        assert_eq!(parsed.mac_size(), 16);
    }

    #[test]
    fn key_exchange_message_round_trips() {
        let value = KeyExchangeMessage::new(vec![0xAB; 32]);
        let bytes = value.to_bytes();
        let parsed = KeyExchangeMessage::parse(&bytes, 32).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn auth_challenge_round_trips() {
        let value = AuthChallenge::new([0x42; 32]);
        let parsed = AuthChallenge::parse(&value.to_bytes()).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn auth_response_round_trips() {
        let value = AuthResponse::new(vec![1; 64], vec![2; 32]);
        let bytes = value.to_bytes();
        let parsed = AuthResponse::parse(&bytes, 64, 32).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn encrypted_data_round_trips() {
        let value = EncryptedData::new(vec![9; 24], vec![7; 128], vec![5; 16]);
        let bytes = value.to_bytes();
        let parsed = EncryptedData::parse(&bytes, 24, 16).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn truncated_payloads_are_rejected() {
        assert!(ProtocolVersion::parse(&[0u8; 2]).is_err());
        assert!(CryptoParameters::parse(&[0u8; 4]).is_err());
        assert!(KeyExchangeMessage::parse(&[0u8; 4], 32).is_err());
        assert!(AuthResponse::parse(&[0u8; 4], 64, 32).is_err());
        assert!(EncryptedData::parse(&[0u8; 4], 24, 16).is_err());
    }
}

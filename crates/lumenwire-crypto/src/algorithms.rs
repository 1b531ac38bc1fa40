//! Algorithm identifiers negotiated during capability/parameter exchange.
//!
//! Each algorithm claims one bit of its class's capability mask (as carried
//! by `CryptoCapabilities.kex_mask`/`auth_mask`/`cipher_mask` in
//! `lumenwire-proto`) and one `u8` id (as carried by
//! `CryptoParameters.selected_*`). This crate owns the meaning of those
//! bits and ids; the framer only moves the raw integers.

/// Key-exchange algorithms, one bit per algorithm in a capability mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KexAlgorithm {
    /// X25519 Diffie-Hellman over Curve25519.
    X25519 = 1,
}

/// Authentication algorithms, one bit per algorithm in a capability mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AuthAlgorithm {
    /// No mutual authentication; the session proceeds unauthenticated.
    None = 0,
    /// Ed25519 signature-based authentication.
    Ed25519 = 1,
}

/// AEAD ciphers, one bit per cipher in a capability mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CipherAlgorithm {
    /// `XChaCha20-Poly1305`, 24-byte nonce. Preferred: its extended nonce
    /// makes random per-direction prefixes safe without a counter-reuse
    /// analysis.
    XChaCha20Poly1305 = 1,
    /// `ChaCha20-Poly1305`, 12-byte nonce. Fallback when a peer doesn't
    /// support the extended-nonce variant.
    ChaCha20Poly1305 = 2,
}

impl KexAlgorithm {
    /// Bit this algorithm claims in a `kex_mask`.
    #[must_use]
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Decode a selected-algorithm id.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::X25519),
            _ => None,
        }
    }

    /// Encode to a selected-algorithm id.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

impl AuthAlgorithm {
    /// Bit this algorithm claims in an `auth_mask`.
    #[must_use]
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Decode a selected-algorithm id.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Ed25519),
            _ => None,
        }
    }

    /// Encode to a selected-algorithm id.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

impl CipherAlgorithm {
    /// Bit this cipher claims in a `cipher_mask`.
    #[must_use]
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Decode a selected-algorithm id.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::XChaCha20Poly1305),
            2 => Some(Self::ChaCha20Poly1305),
            _ => None,
        }
    }

    /// Encode to a selected-algorithm id.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Nonce length in bytes for this cipher.
    #[must_use]
    pub const fn nonce_size(self) -> u16 {
        match self {
            Self::XChaCha20Poly1305 => 24,
            Self::ChaCha20Poly1305 => 12,
        }
    }

    /// Authentication tag length in bytes; identical for both ciphers.
    #[must_use]
    pub const fn mac_size(self) -> u16 {
        16
    }
}

/// Pick the strongest algorithm present in both masks, breaking ties by
/// enum declaration order (lower discriminant wins). Mirrors the deterministic,
/// preference-ordered selection the handshake's parameter negotiation phase
/// performs for each algorithm class.
#[must_use]
pub fn negotiate_kex(client_mask: u16, server_mask: u16) -> Option<KexAlgorithm> {
    [KexAlgorithm::X25519]
        .into_iter()
        .find(|algo| client_mask & server_mask & algo.bit() != 0)
}

/// See [`negotiate_kex`].
#[must_use]
pub fn negotiate_auth(client_mask: u16, server_mask: u16) -> Option<AuthAlgorithm> {
    [AuthAlgorithm::Ed25519, AuthAlgorithm::None]
        .into_iter()
        .find(|algo| client_mask & server_mask & algo.bit() != 0)
}

/// See [`negotiate_kex`].
#[must_use]
pub fn negotiate_cipher(client_mask: u16, server_mask: u16) -> Option<CipherAlgorithm> {
    [
        CipherAlgorithm::XChaCha20Poly1305,
        CipherAlgorithm::ChaCha20Poly1305,
    ]
    .into_iter()
    .find(|algo| client_mask & server_mask & algo.bit() != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_prefers_stronger_cipher_when_both_supported() {
        let both = CipherAlgorithm::XChaCha20Poly1305.bit() | CipherAlgorithm::ChaCha20Poly1305.bit();
        assert_eq!(negotiate_cipher(both, both), Some(CipherAlgorithm::XChaCha20Poly1305));
    }

    #[test]
    fn negotiate_falls_back_when_preferred_not_shared() {
        let client = CipherAlgorithm::ChaCha20Poly1305.bit();
        let server = CipherAlgorithm::XChaCha20Poly1305.bit() | CipherAlgorithm::ChaCha20Poly1305.bit();
        assert_eq!(negotiate_cipher(client, server), Some(CipherAlgorithm::ChaCha20Poly1305));
    }

    #[test]
    fn negotiate_returns_none_without_overlap() {
        let client = KexAlgorithm::X25519.bit();
        assert_eq!(negotiate_kex(client, 0), None);
    }

    #[test]
    fn algorithm_ids_round_trip() {
        assert_eq!(KexAlgorithm::from_u8(KexAlgorithm::X25519.to_u8()), Some(KexAlgorithm::X25519));
        assert_eq!(AuthAlgorithm::from_u8(AuthAlgorithm::None.to_u8()), Some(AuthAlgorithm::None));
        assert_eq!(
            CipherAlgorithm::from_u8(CipherAlgorithm::ChaCha20Poly1305.to_u8()),
            Some(CipherAlgorithm::ChaCha20Poly1305)
        );
    }
}

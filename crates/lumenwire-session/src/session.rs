//! The post-handshake encrypted session: AEAD encrypt/decrypt tied to
//! packet sequence numbers.

use bytes::Bytes;
use lumenwire_crypto::{CipherAlgorithm, SessionCipher};
use lumenwire_proto::payloads::EncryptedData;
use lumenwire_proto::{Packet, PacketType};

use crate::error::SessionError;

/// A bidirectional encrypted session bound to one connection's packet
/// sequence numbers.
///
/// Every encrypted payload's associated data binds the packet type,
/// sequence number and client identifier, so header tampering invalidates
/// the AEAD tag even if the ciphertext itself is untouched. Sequence
/// numbers must strictly increase by one on receive; any gap, reorder, or
/// tag failure is fatal for the whole session, not just the offending
/// packet — once that happens, every later call returns
/// [`SessionError::Protocol`] or the original failure without touching the
/// cipher state again.
pub struct EncryptedSession {
    cipher: SessionCipher,
    cipher_algorithm: CipherAlgorithm,
    client_id: u32,
    send_sequence: u32,
    receive_sequence: u32,
    failed: bool,
}

impl EncryptedSession {
    /// Wrap an already-derived [`SessionCipher`] (see
    /// [`lumenwire_crypto::derive_session_keys`]) as a sequence-tracked
    /// session. Both counters start at zero.
    #[must_use]
    pub fn new(cipher: SessionCipher, cipher_algorithm: CipherAlgorithm, client_id: u32) -> Self {
        Self {
            cipher,
            cipher_algorithm,
            client_id,
            send_sequence: 0,
            receive_sequence: 0,
            failed: false,
        }
    }

    /// The next sequence number this side will send.
    #[must_use]
    pub fn send_sequence(&self) -> u32 {
        self.send_sequence
    }

    /// The next sequence number this side expects to receive.
    #[must_use]
    pub fn receive_sequence(&self) -> u32 {
        self.receive_sequence
    }

    /// Whether a prior decrypt failure has permanently closed this session.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Encrypt `plaintext` into an `EncryptedData` packet carrying the next
    /// send sequence number.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Protocol`] if the session has already
    /// failed, or [`SessionError::Crypto`] if the send nonce counter is
    /// exhausted.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Packet, SessionError> {
        if self.failed {
            return Err(SessionError::Protocol("session already failed".to_string()));
        }

        let sequence = self.send_sequence;
        let associated_data = associated_data(PacketType::EncryptedData, sequence, self.client_id);
        let (nonce, ciphertext_and_tag) = self.cipher.encrypt(plaintext, &associated_data)?;

        let mac_size = self.cipher_algorithm.mac_size() as usize;
        let split_at = ciphertext_and_tag.len() - mac_size;
        let payload = EncryptedData::new(
            nonce,
            ciphertext_and_tag[..split_at].to_vec(),
            ciphertext_and_tag[split_at..].to_vec(),
        );

        let packet = Packet::new(
            PacketType::EncryptedData,
            sequence,
            self.client_id,
            Bytes::from(payload.to_bytes()),
        )?;

        self.send_sequence += 1;
        Ok(packet)
    }

    /// Decrypt a received `EncryptedData` packet.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Protocol`] if `packet` isn't `EncryptedData`
    /// or the session has already failed, [`SessionError::SequenceViolation`]
    /// if the packet's sequence number doesn't match the expected next
    /// value, and [`SessionError::Crypto`] if the AEAD tag doesn't verify.
    /// Every error path here permanently fails the session.
    pub fn decrypt(&mut self, packet: &Packet) -> Result<Vec<u8>, SessionError> {
        if self.failed {
            return Err(SessionError::Protocol("session already failed".to_string()));
        }

        if packet.packet_type() != PacketType::EncryptedData {
            self.failed = true;
            return Err(SessionError::Protocol(format!(
                "expected EncryptedData, got {:?}",
                packet.packet_type()
            )));
        }

        let sequence = packet.header().sequence();
        if sequence != self.receive_sequence {
            self.failed = true;
            return Err(SessionError::SequenceViolation {
                expected: self.receive_sequence,
                actual: sequence,
            });
        }

        let nonce_size = self.cipher_algorithm.nonce_size();
        let mac_size = self.cipher_algorithm.mac_size();
        let encrypted = match EncryptedData::parse(packet.payload(), nonce_size, mac_size) {
            Ok(encrypted) => encrypted,
            Err(err) => {
                self.failed = true;
                return Err(SessionError::from(err));
            },
        };

        let mut combined = encrypted.ciphertext().to_vec();
        combined.extend_from_slice(encrypted.tag());
        let associated_data =
            associated_data(PacketType::EncryptedData, sequence, packet.header().client_id());

        let plaintext = match self.cipher.decrypt(encrypted.nonce(), &combined, &associated_data) {
            Ok(plaintext) => plaintext,
            Err(err) => {
                self.failed = true;
                return Err(SessionError::from(err));
            },
        };

        self.receive_sequence += 1;
        Ok(plaintext)
    }
}

fn associated_data(packet_type: PacketType, sequence: u32, client_id: u32) -> Vec<u8> {
    let mut associated_data = Vec::with_capacity(2 + 4 + 4);
    associated_data.extend_from_slice(&packet_type.to_u16().to_be_bytes());
    associated_data.extend_from_slice(&sequence.to_be_bytes());
    associated_data.extend_from_slice(&client_id.to_be_bytes());
    associated_data
}

#[cfg(test)]
mod tests {
    use lumenwire_crypto::kex::EphemeralKeyPair;
    use lumenwire_crypto::{derive_session_keys, SessionCipher};

    use super::*;

    fn paired_sessions(client_id: u32) -> (EncryptedSession, EncryptedSession) {
        let alice = EphemeralKeyPair::generate(|buf| buf.fill(0x11));
        let bob = EphemeralKeyPair::generate(|buf| buf.fill(0x22));
        let alice_public = alice.public_key();
        let bob_public = bob.public_key();
        let shared_a = alice.diffie_hellman(&bob_public).unwrap();
        let shared_b = bob.diffie_hellman(&alice_public).unwrap();

        let transcript = b"test-transcript";
        let client_keys =
            derive_session_keys(&shared_a, transcript, CipherAlgorithm::XChaCha20Poly1305, true)
                .unwrap();
        let server_keys =
            derive_session_keys(&shared_b, transcript, CipherAlgorithm::XChaCha20Poly1305, false)
                .unwrap();

        let client_cipher = SessionCipher::new(
            CipherAlgorithm::XChaCha20Poly1305,
            client_keys.send.key(),
            client_keys.send.nonce_prefix().to_vec(),
            client_keys.receive.key(),
            client_keys.receive.nonce_prefix().to_vec(),
        );
        let server_cipher = SessionCipher::new(
            CipherAlgorithm::XChaCha20Poly1305,
            server_keys.send.key(),
            server_keys.send.nonce_prefix().to_vec(),
            server_keys.receive.key(),
            server_keys.receive.nonce_prefix().to_vec(),
        );

        (
            EncryptedSession::new(client_cipher, CipherAlgorithm::XChaCha20Poly1305, client_id),
            EncryptedSession::new(server_cipher, CipherAlgorithm::XChaCha20Poly1305, client_id),
        )
    }

    #[test]
    fn round_trips_through_packet_layer() {
        let (mut client, mut server) = paired_sessions(7);

        let packet = client.encrypt(b"hello server").unwrap();
        assert_eq!(packet.header().sequence(), 0);
        let plaintext = server.decrypt(&packet).unwrap();

        assert_eq!(plaintext, b"hello server");
        assert_eq!(client.send_sequence(), 1);
        assert_eq!(server.receive_sequence(), 1);
    }

    #[test]
    fn sequence_gap_fails_the_session() {
        let (mut client, mut server) = paired_sessions(1);

        let _first = client.encrypt(b"one").unwrap();
        let second = client.encrypt(b"two").unwrap();

        let err = server.decrypt(&second).unwrap_err();
        assert!(matches!(err, SessionError::SequenceViolation { expected: 0, actual: 1 }));
        assert!(server.is_failed());
    }

    #[test]
    fn failed_session_rejects_further_calls() {
        let (mut client, mut server) = paired_sessions(1);

        let _first = client.encrypt(b"one").unwrap();
        let second = client.encrypt(b"two").unwrap();
        let _ = server.decrypt(&second);

        let third = client.encrypt(b"three").unwrap();
        let err = server.decrypt(&third).unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }

    #[test]
    fn tampered_ciphertext_is_rejected_by_aead() {
        let (mut client, mut server) = paired_sessions(1);

        let packet = client.encrypt(b"tamper me").unwrap();
        let mut payload = packet.payload().to_vec();
        let last = payload.len() - 1;
        payload[last] ^= 0x01;

        // Rebuild the packet with a correct CRC over the tampered payload,
        // so the framer's checksum doesn't mask what this test targets: the
        // AEAD tag must independently reject the tamper.
        let tampered = Packet::new(
            PacketType::EncryptedData,
            packet.header().sequence(),
            packet.header().client_id(),
            Bytes::from(payload),
        )
        .unwrap();

        let err = server.decrypt(&tampered).unwrap_err();
        assert!(matches!(err, SessionError::Crypto(_)));
        assert!(server.is_failed());
    }
}

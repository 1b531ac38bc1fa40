//! Deterministic simulation tests for the handshake state machine.
//!
//! Each test runs the handshake inside a [`turmoil`] simulation even though
//! [`lumenwire_harness::scenario::run_handshake`] itself performs no
//! network I/O — this keeps the suite in the same harness used by tests
//! that do need a simulated transport, and catches any future `Environment`
//! call that accidentally reaches for the real clock.

use lumenwire_crypto::algorithms::{AuthAlgorithm, CipherAlgorithm, KexAlgorithm};
use lumenwire_crypto::identity::InMemoryIdentity;
use lumenwire_crypto::KnownHosts;
use lumenwire_harness::scenario::{run_handshake, ClientConfig, ServerConfig, SideConfig};
use lumenwire_session::{HandshakeState, SessionError, SupportedAlgorithms};

fn unauthenticated_algorithms() -> SupportedAlgorithms {
    SupportedAlgorithms {
        kex_mask: KexAlgorithm::X25519.bit(),
        auth_mask: AuthAlgorithm::None.bit(),
        cipher_mask: CipherAlgorithm::XChaCha20Poly1305.bit() | CipherAlgorithm::ChaCha20Poly1305.bit(),
    }
}

fn authenticated_algorithms() -> SupportedAlgorithms {
    SupportedAlgorithms {
        kex_mask: KexAlgorithm::X25519.bit(),
        auth_mask: AuthAlgorithm::Ed25519.bit(),
        cipher_mask: CipherAlgorithm::XChaCha20Poly1305.bit() | CipherAlgorithm::ChaCha20Poly1305.bit(),
    }
}

#[test]
fn unauthenticated_handshake_reaches_ready_on_both_sides() {
    let mut sim = turmoil::Builder::new().build();

    sim.host("sim-server", || async {
        let client = ClientConfig {
            side: SideConfig { supported: unauthenticated_algorithms(), identity: None },
            known_hosts: KnownHosts::new(),
        };
        let server = ServerConfig {
            side: SideConfig { supported: unauthenticated_algorithms(), identity: None },
            authorized_client_keys: Vec::new(),
        };

        let outcome = run_handshake(client, server, 1);

        assert_eq!(outcome.client_state, HandshakeState::Ready);
        assert_eq!(outcome.server_state, HandshakeState::Ready);
        assert!(outcome.client_error.is_none());
        assert!(outcome.server_error.is_none());

        let mut client_session = outcome.client_session.expect("client reached Ready with a session");
        let mut server_session = outcome.server_session.expect("server reached Ready with a session");

        let packet = client_session.encrypt(b"hello from the client").unwrap();
        let plaintext = server_session.decrypt(&packet).unwrap();
        assert_eq!(plaintext, b"hello from the client");

        let reply = server_session.encrypt(b"hello back").unwrap();
        let plaintext = client_session.decrypt(&reply).unwrap();
        assert_eq!(plaintext, b"hello back");

        Ok(())
    });

    sim.run().unwrap();
}

#[test]
fn same_seed_reproduces_the_same_negotiated_cipher() {
    let mut sim = turmoil::Builder::new().build();

    sim.host("sim-server", || async {
        let make_client = || ClientConfig {
            side: SideConfig { supported: unauthenticated_algorithms(), identity: None },
            known_hosts: KnownHosts::new(),
        };
        let make_server = || ServerConfig {
            side: SideConfig { supported: unauthenticated_algorithms(), identity: None },
            authorized_client_keys: Vec::new(),
        };

        let a = run_handshake(make_client(), make_server(), 7);
        let b = run_handshake(make_client(), make_server(), 7);

        assert_eq!(a.client_state, HandshakeState::Ready);
        assert_eq!(b.client_state, HandshakeState::Ready);
        assert_eq!(
            a.client_session.unwrap().send_sequence(),
            b.client_session.unwrap().send_sequence()
        );

        Ok(())
    });

    sim.run().unwrap();
}

#[test]
fn unrecognized_client_key_is_rejected_by_the_server() {
    let mut sim = turmoil::Builder::new().build();

    sim.host("sim-server", || async {
        let client_identity = InMemoryIdentity::from_seed([7u8; 32]);
        let client = ClientConfig {
            side: SideConfig {
                supported: authenticated_algorithms(),
                identity: Some(Box::new(client_identity)),
            },
            known_hosts: KnownHosts::new(),
        };

        let server_identity = InMemoryIdentity::from_seed([9u8; 32]);
        let server = ServerConfig {
            side: SideConfig {
                supported: authenticated_algorithms(),
                identity: Some(Box::new(server_identity)),
            },
            // Deliberately does not include the client's public key.
            authorized_client_keys: vec![[0u8; 32]],
        };

        let outcome = run_handshake(client, server, 3);

        assert!(matches!(outcome.server_state, HandshakeState::Failed(_)));
        assert!(matches!(outcome.server_error, Some(SessionError::Crypto(_))));
        assert!(outcome.server_session.is_none());

        Ok(())
    });

    sim.run().unwrap();
}

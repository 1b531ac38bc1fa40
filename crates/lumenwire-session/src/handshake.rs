//! The crypto handshake state machine.
//!
//! Every phase is client-initiated, server-responded: the client always
//! sends the first message of a phase and the server always replies in the
//! same call. This keeps each side's local send/receive order identical to
//! the other side's, which matters because both sides fold every handshake
//! payload into a running [`Transcript`] in that same order — a symmetric
//! "both sides announce simultaneously" version of phase 1 would let the
//! two transcripts diverge under concurrent sends. The wire-level role is
//! still that of a real client/server; the driver on each side is the one
//! that decides whether to call [`HandshakeContext::start`] or just wait
//! for the peer's first message.
//!
//! Transitions are pure functions of `(state, inbound packet)`, mirroring
//! the send/receive-pair structure of the underlying protocol: each method
//! takes the current packet (or a timeout/cancellation signal) and returns
//! the actions the driver should take, never performing I/O itself.

use std::ops::Sub;
use std::time::Duration;

use bytes::Bytes;
use lumenwire_core::Environment;
use lumenwire_crypto::identity::{verify_signature, IdentityKey};
use lumenwire_crypto::kex::EphemeralKeyPair;
use lumenwire_crypto::{
    derive_session_keys, AuthAlgorithm, CipherAlgorithm, KexAlgorithm, KnownHosts, SessionCipher,
    SessionKeys,
};
use lumenwire_proto::payloads::{
    AuthChallenge, AuthResponse, CryptoCapabilities, CryptoParameters, HandshakeComplete,
    KeyExchangeMessage, ProtocolVersion,
};
use lumenwire_proto::{Packet, PacketType};

use crate::config::{HandshakeConfig, MIN_PROTOCOL_VERSION, PROTOCOL_REVISION, PROTOCOL_VERSION};
use crate::error::SessionError;
use crate::session::EncryptedSession;
use crate::state::{FailureReason, HandshakeState};
use crate::transcript::Transcript;

/// Byte length of an identity public key (Ed25519).
const AUTH_PUBLIC_KEY_SIZE: u16 = 32;
/// Byte length of an Ed25519 signature.
const SIGNATURE_SIZE: u16 = 64;
/// Byte length of an X25519 shared secret.
const SHARED_SECRET_SIZE: u16 = 32;
/// This implementation performs no separate HMAC key-confirmation step;
/// the field exists on the wire for forward compatibility with a peer that
/// does.
const UNUSED_HMAC_SIZE: u16 = 0;

/// Which end of the connection this context drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Initiates every phase.
    Client,
    /// Responds to the client's messages.
    Server,
}

/// The algorithm classes a side is willing to negotiate, one capability
/// mask per class.
#[derive(Debug, Clone, Copy)]
pub struct SupportedAlgorithms {
    /// Key-exchange algorithms this side can use.
    pub kex_mask: u16,
    /// Authentication algorithms this side can use (include
    /// [`AuthAlgorithm::None`]'s bit to allow an unauthenticated session).
    pub auth_mask: u16,
    /// AEAD ciphers this side can use.
    pub cipher_mask: u16,
}

impl SupportedAlgorithms {
    /// Every algorithm this crate implements.
    #[must_use]
    pub fn all() -> Self {
        Self {
            kex_mask: KexAlgorithm::X25519.bit(),
            auth_mask: AuthAlgorithm::None.bit() | AuthAlgorithm::Ed25519.bit(),
            cipher_mask: CipherAlgorithm::XChaCha20Poly1305.bit() | CipherAlgorithm::ChaCha20Poly1305.bit(),
        }
    }
}

/// The algorithms both sides agreed to use, materialized from
/// [`CryptoParameters`].
#[derive(Debug, Clone, Copy)]
pub struct NegotiatedParams {
    /// Chosen key-exchange algorithm.
    pub kex: KexAlgorithm,
    /// Chosen authentication algorithm.
    pub auth: AuthAlgorithm,
    /// Chosen AEAD cipher.
    pub cipher: CipherAlgorithm,
    /// Whether the authentication phase runs at all.
    pub verification_enabled: bool,
}

/// What the driver should do in response to a transition.
pub enum HandshakeAction {
    /// Send this packet to the peer.
    SendPacket(Packet),
    /// Close the transport; the handshake has reached a terminal state.
    Close {
        /// Human-readable reason, suitable for logging.
        reason: String,
    },
    /// The handshake reached `Ready`. Hands over the encrypted session;
    /// the driver should stop calling handshake methods and switch to
    /// encrypting/decrypting through it.
    Ready(Box<EncryptedSession>),
}

/// The crypto handshake state machine described in the module docs.
///
/// Generic over `I`, the instant type, so it can run under a real clock
/// ([`std::time::Instant`]) or a simulated one, exactly like
/// [`lumenwire_core::Environment::Instant`].
pub struct HandshakeContext<I> {
    role: Role,
    state: HandshakeState,
    config: HandshakeConfig,
    client_id: u32,
    started_at: I,
    send_sequence: u32,
    transcript: Transcript,
    supported: SupportedAlgorithms,
    params: Option<NegotiatedParams>,
    kex_keypair: Option<EphemeralKeyPair>,
    session_keys: Option<SessionKeys>,
    auth_transcript_hash: Option<[u8; 32]>,
    own_challenge_nonce: Option<[u8; 32]>,
    identity: Option<Box<dyn IdentityKey>>,
    authorized_keys: Vec<[u8; 32]>,
    known_hosts: Option<KnownHosts>,
    host: String,
    port: u16,
    peer_authenticated: bool,
    local_complete_sent: bool,
}

impl<I> HandshakeContext<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Build a new handshake context. Still `Idle`; call [`Self::start`]
    /// (client side only — the server waits passively for the client's
    /// first message) to begin.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        role: Role,
        config: HandshakeConfig,
        client_id: u32,
        supported: SupportedAlgorithms,
        identity: Option<Box<dyn IdentityKey>>,
        authorized_keys: Vec<[u8; 32]>,
        known_hosts: Option<KnownHosts>,
        host: String,
        port: u16,
        now: I,
    ) -> Self {
        Self {
            role,
            state: HandshakeState::Idle,
            config,
            client_id,
            started_at: now,
            send_sequence: 0,
            transcript: Transcript::new(),
            supported,
            params: None,
            kex_keypair: None,
            session_keys: None,
            auth_transcript_hash: None,
            own_challenge_nonce: None,
            identity,
            authorized_keys,
            known_hosts,
            host,
            port,
            peer_authenticated: false,
            local_complete_sent: false,
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// The role this context drives.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// The negotiated parameters, once `ParametersNegotiated` or later.
    #[must_use]
    pub fn params(&self) -> Option<&NegotiatedParams> {
        self.params.as_ref()
    }

    /// Client-side entry point: send the initial `ProtocolVersion`
    /// announcement. A no-op (returns no actions) for [`Role::Server`],
    /// which only reacts to inbound packets.
    ///
    /// # Errors
    ///
    /// Never fails for [`Role::Server`]. For [`Role::Client`], only fails
    /// if called more than once (`state` is no longer `Idle`).
    pub fn start(&mut self) -> Result<Vec<HandshakeAction>, SessionError> {
        if self.role == Role::Server {
            return Ok(vec![]);
        }
        if self.state != HandshakeState::Idle {
            return Err(SessionError::Protocol("start called outside Idle".to_string()));
        }

        let version = ProtocolVersion::new(PROTOCOL_VERSION, PROTOCOL_REVISION, true);
        self.transcript.extend(&version.to_bytes());
        let packet = self.build_packet(PacketType::ProtocolVersion, &version.to_bytes())?;
        Ok(vec![HandshakeAction::SendPacket(packet)])
    }

    /// Check the cooperative cancellation flag and the handshake deadline.
    /// The driver should call this between phases and before each blocking
    /// read, per the spec's cancellation contract.
    pub fn tick(&mut self, now: I, cancelled: bool) -> Vec<HandshakeAction> {
        if self.state.is_terminal() {
            return vec![];
        }
        if cancelled {
            self.state = HandshakeState::Failed(FailureReason::Cancelled);
            tracing::warn!(role = ?self.role, "handshake cancelled");
            return vec![HandshakeAction::Close {
                reason: "handshake cancelled".to_string(),
            }];
        }
        let elapsed = now - self.started_at;
        if elapsed > self.config.deadline {
            self.state = HandshakeState::Failed(FailureReason::Timeout(elapsed));
            tracing::warn!(role = ?self.role, ?elapsed, "handshake timed out");
            return vec![HandshakeAction::Close {
                reason: format!("handshake timeout after {elapsed:?}"),
            }];
        }
        vec![]
    }

    /// Process one inbound packet, advancing the state machine.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on any malformed packet, unexpected packet
    /// for the current state, algorithm negotiation failure, or
    /// authentication failure. On error, `state()` becomes
    /// [`HandshakeState::Failed`] before this method returns.
    pub fn handle_packet<E>(
        &mut self,
        packet: &Packet,
        env: &E,
    ) -> Result<Vec<HandshakeAction>, SessionError>
    where
        E: Environment<Instant = I>,
    {
        match self.handle_packet_inner(packet, env) {
            Ok(actions) => {
                tracing::debug!(role = ?self.role, state = ?self.state, "handshake advanced");
                Ok(actions)
            },
            Err(err) => {
                if !self.state.is_terminal() {
                    self.state = HandshakeState::Failed(failure_reason(&err));
                }
                tracing::warn!(role = ?self.role, error = %err, "handshake packet rejected");
                Err(err)
            },
        }
    }

    fn handle_packet_inner<E>(
        &mut self,
        packet: &Packet,
        env: &E,
    ) -> Result<Vec<HandshakeAction>, SessionError>
    where
        E: Environment<Instant = I>,
    {
        match (&self.state, packet.packet_type()) {
            (HandshakeState::Idle, PacketType::ProtocolVersion) => self.on_protocol_version(packet),
            (HandshakeState::VersionExchanged, PacketType::CryptoCapabilities) => {
                self.on_crypto_capabilities(packet)
            },
            (HandshakeState::VersionExchanged, PacketType::CryptoParameters) => {
                self.on_crypto_parameters(packet, env)
            },
            (HandshakeState::ParametersNegotiated, PacketType::KeyExchangeInit) => {
                self.on_key_exchange_init(packet, env)
            },
            (HandshakeState::ParametersNegotiated, PacketType::KeyExchangeResponse) => {
                self.on_key_exchange_response(packet)
            },
            (HandshakeState::Authenticating, PacketType::AuthChallenge) => {
                self.on_auth_challenge(packet, env)
            },
            (HandshakeState::Authenticating, PacketType::AuthResponse) => {
                self.on_auth_response(packet, env)
            },
            (HandshakeState::KeyExchanged | HandshakeState::Authenticating, PacketType::HandshakeComplete) => {
                self.on_handshake_complete(packet)
            },
            (state, packet_type) => Err(SessionError::Protocol(format!(
                "unexpected packet {packet_type:?} in state {state:?}"
            ))),
        }
    }

    fn on_protocol_version(&mut self, packet: &Packet) -> Result<Vec<HandshakeAction>, SessionError> {
        let peer_version = ProtocolVersion::parse(packet.payload())?;
        if peer_version.version() < MIN_PROTOCOL_VERSION {
            return Err(SessionError::Protocol(format!(
                "unsupported protocol version {}",
                peer_version.version()
            )));
        }

        match self.role {
            Role::Server => {
                self.transcript.extend(&peer_version.to_bytes());
                let own_version = ProtocolVersion::new(PROTOCOL_VERSION, PROTOCOL_REVISION, true);
                self.transcript.extend(&own_version.to_bytes());
                self.state = HandshakeState::VersionExchanged;
                let reply = self.build_packet(PacketType::ProtocolVersion, &own_version.to_bytes())?;
                Ok(vec![HandshakeAction::SendPacket(reply)])
            },
            Role::Client => {
                self.transcript.extend(&peer_version.to_bytes());
                self.state = HandshakeState::VersionExchanged;

                let capabilities = CryptoCapabilities::new(
                    self.supported.kex_mask,
                    self.supported.auth_mask,
                    self.supported.cipher_mask,
                );
                self.transcript.extend(&capabilities.to_bytes());
                let packet = self.build_packet(PacketType::CryptoCapabilities, &capabilities.to_bytes())?;
                Ok(vec![HandshakeAction::SendPacket(packet)])
            },
        }
    }

    fn on_crypto_capabilities(&mut self, packet: &Packet) -> Result<Vec<HandshakeAction>, SessionError> {
        debug_assert_eq!(self.role, Role::Server);
        let client_capabilities = CryptoCapabilities::parse(packet.payload())?;
        self.transcript.extend(&client_capabilities.to_bytes());

        let kex = lumenwire_crypto::algorithms::negotiate_kex(
            client_capabilities.kex_mask(),
            self.supported.kex_mask,
        )
        .ok_or(SessionError::NoCommonAlgorithm { class: "key exchange" })?;
        let auth = lumenwire_crypto::algorithms::negotiate_auth(
            client_capabilities.auth_mask(),
            self.supported.auth_mask,
        )
        .ok_or(SessionError::NoCommonAlgorithm { class: "authentication" })?;
        let cipher = lumenwire_crypto::algorithms::negotiate_cipher(
            client_capabilities.cipher_mask(),
            self.supported.cipher_mask,
        )
        .ok_or(SessionError::NoCommonAlgorithm { class: "cipher" })?;

        let verification_enabled = auth != AuthAlgorithm::None;
        self.params = Some(NegotiatedParams {
            kex,
            auth,
            cipher,
            verification_enabled,
        });
        tracing::info!(?kex, ?auth, ?cipher, verification_enabled, "negotiated crypto parameters");

        let parameters = CryptoParameters::new(
            kex.to_u8(),
            auth.to_u8(),
            cipher.to_u8(),
            verification_enabled,
            lumenwire_crypto::kex::PUBLIC_KEY_SIZE as u16,
            AUTH_PUBLIC_KEY_SIZE,
            SIGNATURE_SIZE,
            SHARED_SECRET_SIZE,
            cipher.nonce_size(),
            cipher.mac_size(),
            UNUSED_HMAC_SIZE,
        );
        self.transcript.extend(&parameters.to_bytes());
        self.state = HandshakeState::ParametersNegotiated;

        let packet = self.build_packet(PacketType::CryptoParameters, &parameters.to_bytes())?;
        Ok(vec![HandshakeAction::SendPacket(packet)])
    }

    fn on_crypto_parameters<E>(
        &mut self,
        packet: &Packet,
        env: &E,
    ) -> Result<Vec<HandshakeAction>, SessionError>
    where
        E: Environment<Instant = I>,
    {
        debug_assert_eq!(self.role, Role::Client);
        let parameters = CryptoParameters::parse(packet.payload())?;
        self.transcript.extend(&parameters.to_bytes());

        let kex = KexAlgorithm::from_u8(parameters.selected_kex())
            .ok_or_else(|| SessionError::Protocol("unknown selected_kex id".to_string()))?;
        let auth = AuthAlgorithm::from_u8(parameters.selected_auth())
            .ok_or_else(|| SessionError::Protocol("unknown selected_auth id".to_string()))?;
        let cipher = CipherAlgorithm::from_u8(parameters.selected_cipher())
            .ok_or_else(|| SessionError::Protocol("unknown selected_cipher id".to_string()))?;

        self.params = Some(NegotiatedParams {
            kex,
            auth,
            cipher,
            verification_enabled: parameters.verification_enabled(),
        });
        tracing::info!(
            ?kex,
            ?auth,
            ?cipher,
            verification_enabled = parameters.verification_enabled(),
            "accepted negotiated crypto parameters"
        );
        self.state = HandshakeState::ParametersNegotiated;

        let keypair = EphemeralKeyPair::generate(|buf| env.random_bytes(buf));
        let public_key = keypair.public_key().to_vec();
        self.kex_keypair = Some(keypair);

        self.transcript.extend(&public_key);
        let packet = self.build_packet(PacketType::KeyExchangeInit, &public_key)?;
        Ok(vec![HandshakeAction::SendPacket(packet)])
    }

    fn on_key_exchange_init<E>(
        &mut self,
        packet: &Packet,
        env: &E,
    ) -> Result<Vec<HandshakeAction>, SessionError>
    where
        E: Environment<Instant = I>,
    {
        debug_assert_eq!(self.role, Role::Server);
        let Some(params) = self.params else {
            return Err(SessionError::Protocol("parameters missing at key exchange".to_string()));
        };

        let client_kex = KeyExchangeMessage::parse(packet.payload(), params.kex_public_key_size())?;
        self.transcript.extend(client_kex.public_key());

        let keypair = EphemeralKeyPair::generate(|buf| env.random_bytes(buf));
        let public_key = keypair.public_key().to_vec();
        let shared_secret = keypair.diffie_hellman(client_kex.public_key())?;

        self.transcript.extend(&public_key);
        let transcript_hash = self.transcript.hash();
        let session_keys =
            derive_session_keys(&shared_secret, &transcript_hash, params.cipher, false)?;
        self.session_keys = Some(session_keys);

        let response_packet = self.build_packet(PacketType::KeyExchangeResponse, &public_key)?;
        let mut actions = vec![HandshakeAction::SendPacket(response_packet)];

        if params.verification_enabled {
            self.auth_transcript_hash = Some(transcript_hash);
            self.state = HandshakeState::Authenticating;
            let mut nonce = [0u8; 32];
            env.random_bytes(&mut nonce);
            self.own_challenge_nonce = Some(nonce);
            let challenge = AuthChallenge::new(nonce);
            self.transcript.extend(&challenge.to_bytes());
            let challenge_packet = self.build_packet(PacketType::AuthChallenge, &challenge.to_bytes())?;
            actions.push(HandshakeAction::SendPacket(challenge_packet));
        } else {
            self.state = HandshakeState::KeyExchanged;
            actions.extend(self.send_handshake_complete()?);
        }

        Ok(actions)
    }

    fn on_key_exchange_response(&mut self, packet: &Packet) -> Result<Vec<HandshakeAction>, SessionError> {
        debug_assert_eq!(self.role, Role::Client);
        let Some(params) = self.params else {
            return Err(SessionError::Protocol("parameters missing at key exchange".to_string()));
        };
        let Some(keypair) = self.kex_keypair.take() else {
            return Err(SessionError::Protocol("no ephemeral keypair pending".to_string()));
        };

        let server_kex = KeyExchangeMessage::parse(packet.payload(), params.kex_public_key_size())?;
        self.transcript.extend(server_kex.public_key());

        let shared_secret = keypair.diffie_hellman(server_kex.public_key())?;
        let transcript_hash = self.transcript.hash();
        let session_keys = derive_session_keys(&shared_secret, &transcript_hash, params.cipher, true)?;
        self.session_keys = Some(session_keys);

        if params.verification_enabled {
            self.auth_transcript_hash = Some(transcript_hash);
            self.state = HandshakeState::Authenticating;
            Ok(vec![])
        } else {
            self.state = HandshakeState::KeyExchanged;
            self.send_handshake_complete()
        }
    }

    /// Handle an `AuthChallenge` from the peer. Only the client receives
    /// one directly from the server's phase-4 opening move; the server's
    /// symmetric challenge (asking the client to prove the *server's*
    /// identity back to itself) arrives as the same packet type, so both
    /// roles funnel through here.
    fn on_auth_challenge<E>(
        &mut self,
        packet: &Packet,
        env: &E,
    ) -> Result<Vec<HandshakeAction>, SessionError>
    where
        E: Environment<Instant = I>,
    {
        let Some(transcript_hash) = self.auth_transcript_hash else {
            return Err(SessionError::Protocol("auth transcript hash missing".to_string()));
        };
        let Some(identity) = self.identity.as_ref() else {
            return Err(SessionError::Protocol(
                "verification_enabled but no identity key configured".to_string(),
            ));
        };

        let challenge = AuthChallenge::parse(packet.payload())?;
        self.transcript.extend(&challenge.to_bytes());

        let message = signing_message(&challenge.nonce(), &transcript_hash);
        let signature = identity.sign(&message);
        let response = AuthResponse::new(signature.to_vec(), identity.public_key().to_vec());
        self.transcript.extend(&response.to_bytes());

        let mut actions =
            vec![HandshakeAction::SendPacket(self.build_packet(PacketType::AuthResponse, &response.to_bytes())?)];

        if self.role == Role::Client {
            // Symmetric challenge: the client now asks the server to prove
            // its own identity, which the client will check against its
            // known-hosts store once the matching `AuthResponse` arrives.
            let mut nonce = [0u8; 32];
            env.random_bytes(&mut nonce);
            self.own_challenge_nonce = Some(nonce);
            let server_challenge = AuthChallenge::new(nonce);
            self.transcript.extend(&server_challenge.to_bytes());
            let server_challenge_packet =
                self.build_packet(PacketType::AuthChallenge, &server_challenge.to_bytes())?;
            actions.push(HandshakeAction::SendPacket(server_challenge_packet));
        } else if self.peer_authenticated {
            // The client's own `AuthResponse` (proving its identity to this
            // server) already arrived before this, its second challenge —
            // both halves of mutual authentication are now satisfied.
            self.state = HandshakeState::KeyExchanged;
            actions.extend(self.send_handshake_complete()?);
        }

        Ok(actions)
    }

    fn on_auth_response<E>(
        &mut self,
        packet: &Packet,
        _env: &E,
    ) -> Result<Vec<HandshakeAction>, SessionError>
    where
        E: Environment<Instant = I>,
    {
        let Some(transcript_hash) = self.auth_transcript_hash else {
            return Err(SessionError::Protocol("auth transcript hash missing".to_string()));
        };

        let response = AuthResponse::parse(packet.payload(), SIGNATURE_SIZE, AUTH_PUBLIC_KEY_SIZE)?;
        self.transcript.extend(&response.to_bytes());

        match self.role {
            Role::Server => {
                // Verifying the client's proof against the challenge this
                // server issued in `on_key_exchange_init`.
                let Some(own_challenge) = self.own_challenge_nonce else {
                    return Err(SessionError::Protocol("server issued no challenge to verify against".to_string()));
                };
                let message = signing_message(&own_challenge, &transcript_hash);
                verify_signature(response.public_key(), &message, response.signature())?;

                let presented: [u8; 32] = response
                    .public_key()
                    .try_into()
                    .map_err(|_| SessionError::Protocol("malformed client public key".to_string()))?;
                if !self.authorized_keys.iter().any(|key| key == &presented) {
                    return Err(SessionError::Crypto(
                        lumenwire_crypto::CryptoError::SignatureInvalid,
                    ));
                }

                self.peer_authenticated = true;
                Ok(vec![])
            },
            Role::Client => {
                let Some(known_hosts) = self.known_hosts.as_mut() else {
                    return Err(SessionError::Protocol("client known-hosts store required".to_string()));
                };
                let Some(own_challenge) = self.own_challenge_nonce else {
                    return Err(SessionError::Protocol("client issued no challenge to verify against".to_string()));
                };

                let message = signing_message(&own_challenge, &transcript_hash);
                verify_signature(response.public_key(), &message, response.signature())?;

                if !lumenwire_crypto::known_hosts::insecure_host_identity_check_disabled() {
                    known_hosts.verify_or_trust(&self.host, self.port, response.public_key())?;
                }

                self.peer_authenticated = true;
                self.state = HandshakeState::KeyExchanged;
                self.send_handshake_complete()
            },
        }
    }

    fn on_handshake_complete(&mut self, packet: &Packet) -> Result<Vec<HandshakeAction>, SessionError> {
        let _ = HandshakeComplete::parse(packet.payload());

        if let Some(params) = self.params {
            if params.verification_enabled && !self.peer_authenticated {
                return Err(SessionError::Protocol(
                    "HandshakeComplete received before authentication finished".to_string(),
                ));
            }
        }
        if !self.local_complete_sent {
            return Err(SessionError::Protocol(
                "HandshakeComplete received before local completion".to_string(),
            ));
        }

        let Some(params) = self.params else {
            return Err(SessionError::Protocol("parameters missing at completion".to_string()));
        };
        let Some(session_keys) = self.session_keys.take() else {
            return Err(SessionError::Protocol("session keys missing at completion".to_string()));
        };

        let cipher = SessionCipher::new(
            params.cipher,
            session_keys.send.key(),
            session_keys.send.nonce_prefix().to_vec(),
            session_keys.receive.key(),
            session_keys.receive.nonce_prefix().to_vec(),
        );
        self.state = HandshakeState::Ready;
        let session = EncryptedSession::new(cipher, params.cipher, self.client_id);
        Ok(vec![HandshakeAction::Ready(Box::new(session))])
    }

    fn send_handshake_complete(&mut self) -> Result<Vec<HandshakeAction>, SessionError> {
        let complete = HandshakeComplete;
        let packet = self.build_packet(PacketType::HandshakeComplete, &complete.to_bytes())?;
        self.local_complete_sent = true;
        Ok(vec![HandshakeAction::SendPacket(packet)])
    }

    fn build_packet(&mut self, packet_type: PacketType, payload: &[u8]) -> Result<Packet, SessionError> {
        let sequence = self.send_sequence;
        self.send_sequence += 1;
        let packet = Packet::new(packet_type, sequence, self.client_id, Bytes::copy_from_slice(payload))?;
        Ok(packet)
    }
}

fn signing_message(nonce: &[u8; 32], transcript_hash: &[u8; 32]) -> Vec<u8> {
    let mut message = Vec::with_capacity(64);
    message.extend_from_slice(nonce);
    message.extend_from_slice(transcript_hash);
    message
}

fn failure_reason(err: &SessionError) -> FailureReason {
    match err {
        SessionError::Protocol(reason) => FailureReason::Protocol(reason.clone()),
        SessionError::NoCommonAlgorithm { class } => {
            FailureReason::Protocol(format!("no common algorithm for {class}"))
        },
        SessionError::Crypto(_) => FailureReason::AuthRejected,
        SessionError::Timeout { elapsed } => FailureReason::Timeout(*elapsed),
        SessionError::Cancelled => FailureReason::Cancelled,
        SessionError::Network(reason) => FailureReason::Network(reason.clone()),
        SessionError::SequenceViolation { .. } => FailureReason::Protocol(err.to_string()),
    }
}

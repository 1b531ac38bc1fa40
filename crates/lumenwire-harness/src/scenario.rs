//! Drives a full client/server handshake in-memory, with no real transport,
//! by shuttling [`HandshakeAction::SendPacket`] output directly into the
//! peer's `handle_packet`. This exercises the exact same state machine a
//! real driver would, with the socket replaced by a plain queue — the
//! handshake itself performs no I/O either way.

use std::collections::VecDeque;

use lumenwire_crypto::identity::IdentityKey;
use lumenwire_crypto::KnownHosts;
use lumenwire_proto::Packet;
use lumenwire_session::{
    EncryptedSession, HandshakeAction, HandshakeConfig, HandshakeContext, HandshakeState, Role,
    SessionError, SupportedAlgorithms,
};

use crate::sim_env::SimEnv;

/// Fixed identifiers the scenario pins the client's server connection to,
/// so `KnownHosts` entries are addressed consistently across a run.
const SERVER_HOST: &str = "sim-server";
const SERVER_PORT: u16 = 443;

/// Everything a [`run_handshake`] call needs to know about one side.
pub struct SideConfig {
    /// Algorithm classes this side is willing to negotiate.
    pub supported: SupportedAlgorithms,
    /// Identity key used to answer an `AuthChallenge`, if mutual
    /// authentication is negotiated.
    pub identity: Option<Box<dyn IdentityKey>>,
}

/// Server-only configuration: which client identity keys it accepts.
pub struct ServerConfig {
    /// Shared negotiation/identity configuration.
    pub side: SideConfig,
    /// Client public keys the server accepts during authentication. A
    /// client presenting any other key fails the handshake.
    pub authorized_client_keys: Vec<[u8; 32]>,
}

/// Client-only configuration: its trust-on-first-use store for the
/// server's identity key.
pub struct ClientConfig {
    /// Shared negotiation/identity configuration.
    pub side: SideConfig,
    /// Pinned server keys. Left empty to trust-on-first-use.
    pub known_hosts: KnownHosts,
}

/// The terminal state of both sides of a [`run_handshake`] call.
pub struct HandshakeOutcome {
    /// The client's final state.
    pub client_state: HandshakeState,
    /// The server's final state.
    pub server_state: HandshakeState,
    /// The client's encrypted session, if it reached `Ready`.
    pub client_session: Option<Box<EncryptedSession>>,
    /// The server's encrypted session, if it reached `Ready`.
    pub server_session: Option<Box<EncryptedSession>>,
    /// The error that failed the client, if any.
    pub client_error: Option<SessionError>,
    /// The error that failed the server, if any.
    pub server_error: Option<SessionError>,
}

#[derive(Clone, Copy)]
enum Side {
    Client,
    Server,
}

/// Run a full handshake between a client and a server built from `client`
/// and `server`, using `seed` to derive both sides' [`SimEnv`].
///
/// Delivery order matches the protocol's client-initiated-every-phase
/// contract: every packet a side emits is queued for its peer and
/// delivered before the queue is otherwise reordered, so this reproduces
/// exactly what a real transport preserving packet order would observe.
/// Once a side's state machine is terminal (`Ready` or `Failed`), further
/// packets queued for it are dropped rather than delivered — standing in
/// for the transport having been torn down.
#[must_use]
pub fn run_handshake(client: ClientConfig, server: ServerConfig, seed: u64) -> HandshakeOutcome {
    let client_env = SimEnv::new(seed);
    let server_env = SimEnv::new(seed.wrapping_add(1));

    let mut client_ctx = HandshakeContext::new(
        Role::Client,
        HandshakeConfig::default(),
        1,
        client.side.supported,
        client.side.identity,
        Vec::new(),
        Some(client.known_hosts),
        SERVER_HOST.to_string(),
        SERVER_PORT,
        client_env.now(),
    );
    let mut server_ctx = HandshakeContext::new(
        Role::Server,
        HandshakeConfig::default(),
        1,
        server.side.supported,
        server.side.identity,
        server.authorized_client_keys,
        None,
        SERVER_HOST.to_string(),
        SERVER_PORT,
        server_env.now(),
    );

    let mut queue: VecDeque<(Side, Packet)> = VecDeque::new();
    let mut client_session = None;
    let mut server_session = None;
    let mut client_error = None;
    let mut server_error = None;

    for action in client_ctx.start().expect("Idle client always starts cleanly") {
        if let HandshakeAction::SendPacket(packet) = action {
            queue.push_back((Side::Server, packet));
        }
    }

    while let Some((dest, packet)) = queue.pop_front() {
        let (ctx, env, peer) = match dest {
            Side::Client => (&mut client_ctx, &client_env, Side::Server),
            Side::Server => (&mut server_ctx, &server_env, Side::Client),
        };

        if ctx.state().is_terminal() {
            continue;
        }

        match ctx.handle_packet(&packet, env) {
            Ok(actions) => {
                for action in actions {
                    match action {
                        HandshakeAction::SendPacket(reply) => queue.push_back((peer, reply)),
                        HandshakeAction::Close { .. } => {},
                        HandshakeAction::Ready(session) => match dest {
                            Side::Client => client_session = Some(session),
                            Side::Server => server_session = Some(session),
                        },
                    }
                }
            },
            Err(err) => match dest {
                Side::Client => client_error = Some(err),
                Side::Server => server_error = Some(err),
            },
        }
    }

    let client_state = client_ctx.state().clone();
    let server_state = server_ctx.state().clone();
    tracing::info!(seed, ?client_state, ?server_state, "simulated handshake finished");

    HandshakeOutcome {
        client_state,
        server_state,
        client_session,
        server_session,
        client_error,
        server_error,
    }
}

//! Crypto handshake state machine and encrypted session for lumenwire.
//!
//! [`handshake::HandshakeContext`] drives the multi-phase handshake
//! (version exchange, algorithm negotiation, key exchange, optional mutual
//! authentication) to completion and hands over an
//! [`session::EncryptedSession`] bound to the negotiated cipher and the
//! connection's packet sequence numbers. Neither type performs I/O: both
//! are pure state machines that take an inbound [`lumenwire_proto::Packet`]
//! (or a tick signal) and return the actions the driver should take, in the
//! same action-returning style as the packet framer beneath them.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod handshake;
pub mod session;
pub mod state;
pub mod transcript;

pub use config::{HandshakeConfig, MIN_PROTOCOL_VERSION, PROTOCOL_REVISION, PROTOCOL_VERSION};
pub use error::{Result, SessionError};
pub use handshake::{HandshakeAction, HandshakeContext, NegotiatedParams, Role, SupportedAlgorithms};
pub use session::EncryptedSession;
pub use state::{FailureReason, HandshakeState};
pub use transcript::Transcript;

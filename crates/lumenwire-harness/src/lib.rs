//! Deterministic simulation harness for the handshake and session state
//! machines.
//!
//! Neither [`lumenwire_session::HandshakeContext`] nor
//! [`lumenwire_session::EncryptedSession`] performs I/O, so exercising them
//! end to end needs nothing more than a clock and an entropy source — no
//! real socket, no real time. [`sim_env::SimEnv`] supplies both
//! deterministically, and [`scenario::run_handshake`] wires two contexts
//! together through an in-memory packet queue standing in for a transport.
//! Tests that additionally want a simulated network (connection drops,
//! latency, partitions) build on top of these with [`turmoil`] directly.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod scenario;
pub mod sim_env;

pub use scenario::{ClientConfig, HandshakeOutcome, ServerConfig, SideConfig, run_handshake};
pub use sim_env::SimEnv;

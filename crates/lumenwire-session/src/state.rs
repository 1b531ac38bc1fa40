//! Handshake state enum shared by both roles.

use std::time::Duration;

/// Reason an absorbing [`HandshakeState::Failed`] was entered. Carries just
/// enough context to report a useful error without re-deriving it from the
/// state the context was in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A malformed packet, an unsupported version, an unexpected packet for
    /// the current state, or a negotiation failure.
    Protocol(String),
    /// The configured handshake deadline elapsed.
    Timeout(Duration),
    /// Signature verification or authorized-key/known-hosts checking
    /// failed.
    AuthRejected,
    /// The cooperative cancellation flag was observed.
    Cancelled,
    /// The underlying transport failed.
    Network(String),
}

/// States shared by both handshake roles. Legal transitions differ by role
/// (see [`crate::handshake::HandshakeContext`]); the enum itself is
/// role-agnostic so a driver can report progress without knowing which side
/// it's on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    /// No packets exchanged yet.
    Idle,
    /// Both sides have exchanged and validated `ProtocolVersion`.
    VersionExchanged,
    /// The server has selected algorithms and both sides hold the same
    /// [`crate::handshake::NegotiatedParams`].
    ParametersNegotiated,
    /// Both sides hold the same derived session keys.
    KeyExchanged,
    /// Mutual authentication is in progress (only entered when
    /// `verification_enabled`).
    Authenticating,
    /// The handshake is complete; the encrypted session may begin.
    Ready,
    /// Absorbing terminal state reachable from any non-terminal state.
    Failed(FailureReason),
}

impl HandshakeState {
    /// Whether this state has no further transitions (`Ready` or `Failed`).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }
}

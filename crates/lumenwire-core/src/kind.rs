//! Shared error-kind taxonomy.
//!
//! Every fallible operation in the workspace — rendering, framing, the
//! handshake, the encrypted session — ultimately reports one of these seven
//! kinds. Each crate keeps its own `thiserror` enum (so messages stay
//! specific), but implements [`HasErrorKind`] so callers at any layer can
//! make the same triage decision without matching on crate-specific
//! variants.

/// Coarse category an error belongs to, independent of which crate raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed palette, zero-sized frame, oversized payload: caller's
    /// fault, never retried.
    InputInvalid,
    /// Magic mismatch, unknown packet type, unexpected packet for state,
    /// CRC mismatch, field-size mismatch: fatal for the connection.
    Protocol,
    /// Unknown peer key, failed signature, host key changed: fatal,
    /// surfaced with enough context for an operator decision.
    AuthRejected,
    /// A phase deadline elapsed.
    Timeout,
    /// The cancellation flag was observed.
    Cancelled,
    /// Underlying transport I/O failure; the driver decides on retry.
    Network,
    /// Allocation failure or cache build failure; the current operation
    /// aborts but the process may continue.
    Resource,
}

/// Implemented by every error type in the workspace so callers can triage
/// without depending on which crate raised the error.
pub trait HasErrorKind {
    /// The coarse category this error belongs to.
    fn kind(&self) -> ErrorKind;

    /// Whether the operation that raised this error might succeed if
    /// retried unchanged (no state/inputs changed).
    ///
    /// Only [`ErrorKind::Timeout`] and [`ErrorKind::Network`] are ever
    /// transient; protocol violations and rejected authentication never are.
    fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::Timeout | ErrorKind::Network)
    }
}

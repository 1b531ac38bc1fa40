//! Shared types and environment abstraction for lumenwire.
//!
//! This crate is the glue layer underneath both cores: the [`env::Environment`]
//! trait decouples the handshake and session state machines from real
//! system time and randomness (so they can run under deterministic
//! simulation), the [`frame`] and [`terminal`] modules define the records
//! the renderer consumes from its external collaborators, and [`kind`]
//! gives every crate's error type a shared vocabulary for triage.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod frame;
pub mod kind;
pub mod terminal;

pub use env::Environment;
pub use frame::{Frame, FrameError, Pixel};
pub use kind::{ErrorKind, HasErrorKind};
pub use terminal::{ColorSupport, TerminalCapabilities};

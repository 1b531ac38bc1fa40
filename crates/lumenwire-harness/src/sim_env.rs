//! A deterministic [`Environment`] for running the handshake and session
//! state machines under [`turmoil`]'s virtual clock instead of the real
//! system clock and entropy source.

use std::sync::{Mutex, PoisonError};

use lumenwire_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic, seeded stand-in for the real `Environment`.
///
/// `now()` reads `tokio::time::Instant`, which resolves to the virtual
/// clock inside a [`turmoil`] simulation and to the real clock outside one
/// — the same environment works in either context unchanged, matching the
/// production/simulation split the `Environment` trait exists for.
/// `random_bytes` draws from a [`ChaCha8Rng`] seeded at construction, so two
/// `SimEnv`s built from the same seed reproduce byte-for-byte identical
/// handshakes.
#[derive(Clone)]
pub struct SimEnv {
    rng: std::sync::Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Build a new environment seeded deterministically from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: std::sync::Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: std::time::Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}

//! Client-side trust-on-first-use store for server identity keys.
//!
//! Consulted only by the client, and only when the negotiated
//! `verification_enabled` is set. Entries are one per line:
//! `hostname port hex(pubkey)`.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::error::CryptoError;

/// Environment variable that, when set to any non-empty value, disables
/// host-identity pinning entirely (peers are still authenticated if
/// `verification_enabled`, but the client skips comparing the server's key
/// against its known-hosts store). Exists for test harnesses that spin up
/// throwaway servers on every run.
pub const INSECURE_NO_HOST_IDENTITY_CHECK_VAR: &str = "LUMENWIRE_INSECURE_NO_HOST_IDENTITY_CHECK";

/// An in-memory known-hosts store, loadable from and serializable to the
/// `hostname port hex(pubkey)` line format.
#[derive(Debug, Clone, Default)]
pub struct KnownHosts {
    entries: HashMap<(String, u16), Vec<u8>>,
}

impl KnownHosts {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a known-hosts file's contents. Blank lines and lines starting
    /// with `#` are ignored. Malformed lines are skipped rather than
    /// failing the whole parse, so a single corrupted entry doesn't lock
    /// the client out of every other host it has pinned.
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let mut store = Self::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(host), Some(port), Some(hex_key)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            let Ok(port) = port.parse::<u16>() else {
                continue;
            };
            let Ok(key) = decode_hex(hex_key) else {
                continue;
            };
            store.entries.insert((host.to_string(), port), key);
        }
        store
    }

    /// Serialize to the `hostname port hex(pubkey)` line format.
    #[must_use]
    pub fn to_file_format(&self) -> String {
        let mut out = String::new();
        let mut hosts: Vec<_> = self.entries.iter().collect();
        hosts.sort_by(|a, b| a.0.cmp(b.0));
        for ((host, port), key) in hosts {
            let _ = writeln!(out, "{host} {port} {}", encode_hex(key));
        }
        out
    }

    /// Record (or overwrite) the pinned key for `host:port`.
    pub fn pin(&mut self, host: &str, port: u16, public_key: &[u8]) {
        self.entries.insert((host.to_string(), port), public_key.to_vec());
    }

    /// Verify `public_key` against a pinned entry, trusting it on first
    /// contact if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::HostKeyMismatch`] if an entry exists for
    /// `host:port` and its key differs from `public_key`.
    pub fn verify_or_trust(
        &mut self,
        host: &str,
        port: u16,
        public_key: &[u8],
    ) -> Result<(), CryptoError> {
        match self.entries.get(&(host.to_string(), port)) {
            Some(pinned) if pinned.as_slice() == public_key => Ok(()),
            Some(_) => {
                tracing::warn!(host, port, "host key changed since last pin");
                Err(CryptoError::HostKeyMismatch {
                    host: format!("{host}:{port}"),
                })
            },
            None => {
                tracing::info!(host, port, "trusting host key on first contact");
                self.pin(host, port, public_key);
                Ok(())
            },
        }
    }
}

/// Whether host-identity pinning should be skipped, per
/// [`INSECURE_NO_HOST_IDENTITY_CHECK_VAR`].
#[must_use]
pub fn insecure_host_identity_check_disabled() -> bool {
    std::env::var(INSECURE_NO_HOST_IDENTITY_CHECK_VAR)
        .is_ok_and(|value| !value.is_empty())
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn decode_hex(text: &str) -> Result<Vec<u8>, ()> {
    if text.len() % 2 != 0 {
        return Err(());
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).map_err(|_| ()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusts_unknown_host_on_first_contact() {
        let mut store = KnownHosts::new();
        store.verify_or_trust("example.com", 2222, &[1, 2, 3]).unwrap();

        let err = store.verify_or_trust("example.com", 2222, &[9, 9, 9]).unwrap_err();
        assert!(matches!(err, CryptoError::HostKeyMismatch { .. }));
    }

    #[test]
    fn accepts_matching_pinned_key() {
        let mut store = KnownHosts::new();
        store.pin("example.com", 2222, &[1, 2, 3]);
        store.verify_or_trust("example.com", 2222, &[1, 2, 3]).unwrap();
    }

    #[test]
    fn round_trips_through_file_format() {
        let mut store = KnownHosts::new();
        store.pin("host-a", 22, &[0xDE, 0xAD, 0xBE, 0xEF]);
        store.pin("host-b", 2022, &[0x01]);

        let serialized = store.to_file_format();
        let reparsed = KnownHosts::parse(&serialized);

        reparsed.clone().verify_or_trust("host-a", 22, &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        reparsed.clone().verify_or_trust("host-b", 2022, &[0x01]).unwrap();
    }

    #[test]
    fn parse_skips_malformed_lines() {
        let store = KnownHosts::parse("# comment\nbad-line\nhost-a 22 deadbeef\n");
        assert_eq!(store.entries.len(), 1);
    }

    #[test]
    fn different_ports_are_distinct_hosts() {
        let mut store = KnownHosts::new();
        store.pin("example.com", 22, &[1]);
        store.verify_or_trust("example.com", 2222, &[2]).unwrap();
        assert_eq!(store.entries.len(), 2);
    }
}

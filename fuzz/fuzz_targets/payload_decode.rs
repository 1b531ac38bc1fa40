//! Fuzz target for the fixed-layout handshake payload parsers.
//!
//! Exercises every `*::parse` entry point in `lumenwire_proto::payloads`
//! with arbitrary bytes and arbitrary caller-supplied sizes (for the
//! variable-length payloads, whose framing depends on a size negotiated
//! earlier in the handshake rather than on a length prefix of their own).
//!
//! The fuzzer should NEVER panic. All invalid or truncated inputs should
//! return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lumenwire_proto::payloads::{
    AuthChallenge, AuthResponse, CryptoCapabilities, CryptoParameters, EncryptedData,
    HandshakeComplete, KeyExchangeMessage, ProtocolVersion,
};

fuzz_target!(|input: FuzzInput| {
    let data = input.data.as_slice();

    let _ = ProtocolVersion::parse(data);
    let _ = CryptoCapabilities::parse(data);
    let _ = CryptoParameters::parse(data);
    let _ = AuthChallenge::parse(data);
    let _ = HandshakeComplete::parse(data);

    let _ = KeyExchangeMessage::parse(data, input.size_a);
    let _ = AuthResponse::parse(data, input.size_a, input.size_b);
    let _ = EncryptedData::parse(data, input.size_a, input.size_b);
});

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    data: Vec<u8>,
    size_a: u16,
    size_b: u16,
}

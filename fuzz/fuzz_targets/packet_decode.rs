//! Fuzz target for `Packet::decode`.
//!
//! Exercises the full header-parse + CRC-check path against arbitrary
//! byte sequences to find:
//! - Parser crashes or panics
//! - Integer overflows in length arithmetic
//! - Buffer over-reads past the declared payload length
//! - Malformed headers that bypass magic/type/CRC validation
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lumenwire_proto::Packet;

fuzz_target!(|data: &[u8]| {
    let _ = Packet::decode(data);
});

//! Fuzz target for `AsciiFrameHeader::parse`.
//!
//! This sub-header sits ahead of every rendered frame's body and drives a
//! downstream allocation (`original_size()` bytes), so a parser bug here is
//! a direct path to an over-read or an unbounded allocation. The fuzzer
//! should NEVER panic; all invalid or truncated inputs should return an
//! error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lumenwire_proto::AsciiFrameHeader;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = AsciiFrameHeader::parse(data) {
        let _ = header.width();
        let _ = header.height();
        let _ = header.has_color();
        let _ = header.original_size();

        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), AsciiFrameHeader::SIZE);
        let reparsed = AsciiFrameHeader::parse(&bytes).unwrap();
        assert_eq!(reparsed, header);
    }
});

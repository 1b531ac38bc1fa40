//! Length-prefixed, CRC32-checked packet framer for the lumenwire transport.
//!
//! [`Packet`] pairs a fixed [`PacketHeader`] with a variable-length
//! payload. [`payloads`] and [`ascii_frame`] define the fixed-layout
//! structs carried inside specific packet types; everything here is
//! transport-agnostic and knows nothing about sockets, only about
//! `std::io::Read` and in-memory buffers.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod ascii_frame;
mod errors;
mod header;
mod packet;
pub mod payloads;
mod packet_type;

pub use ascii_frame::AsciiFrameHeader;
pub use errors::{ProtocolError, Result};
pub use header::{PacketHeader, DEFAULT_MAX_PAYLOAD_SIZE};
pub use packet::Packet;
pub use packet_type::PacketType;

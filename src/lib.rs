//! netsniff library crate: capture, protocol-chain decoding and observer
//! fan-out, shared by the binary, tests and benchmarks.

pub mod capture;
pub mod config;
pub mod decoder;
pub mod display;
pub mod protocol;
pub mod sniffer;

pub use decoder::{decode_chain, DecodedFrame, DecoderStats, FrameDecoder, FrameError, SessionError};
pub use protocol::{Layer, ProtocolDescriptor, ProtocolRegistry};
pub use sniffer::{Frames, Observer, PacketSniffer};

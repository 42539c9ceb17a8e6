//! Raw frame capture.
//!
//! A [`CaptureSource`] hands the decoder one link-layer frame per call.
//! The libpcap-backed source lives in [`engine`]; [`MemorySource`] replays
//! frames held in memory.

pub mod engine;
pub mod source;

pub use engine::{list_interfaces, CaptureConfig, CaptureError, PcapSource, MAX_FRAME_LEN};
pub use source::{CaptureSource, MemorySource, Recv, StopSignal};

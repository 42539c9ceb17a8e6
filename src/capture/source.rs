use super::CaptureError;
use crate::protocol::ETHERNET;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of one read from a capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recv {
    /// A frame of this many bytes was written to the front of the buffer.
    Frame(usize),
    /// The read timed out without data; the caller may retry.
    Idle,
    /// The source is exhausted and will never produce another frame.
    Eof,
}

/// Anything that yields raw link-layer frames.
pub trait CaptureSource {
    /// Block until a frame arrives, then copy at most `buf.len()` bytes of
    /// it into `buf`. Longer frames are truncated.
    fn recv(&mut self, buf: &mut [u8]) -> Result<Recv, CaptureError>;

    /// Registry name of the outermost header in every frame.
    fn link_protocol(&self) -> &'static str {
        ETHERNET
    }
}

/// Cooperative cancellation flag shared between a signal handler and the
/// capture loop.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Replays a fixed list of frames, then reports end of capture.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    frames: VecDeque<Vec<u8>>,
    link_protocol: Option<&'static str>,
}

impl MemorySource {
    pub fn new<I, F>(frames: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Vec<u8>>,
    {
        MemorySource {
            frames: frames.into_iter().map(Into::into).collect(),
            link_protocol: None,
        }
    }

    /// Decode frames starting from `protocol` instead of Ethernet.
    pub fn with_link_protocol(mut self, protocol: &'static str) -> Self {
        self.link_protocol = Some(protocol);
        self
    }

    pub fn push(&mut self, frame: impl Into<Vec<u8>>) {
        self.frames.push_back(frame.into());
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl CaptureSource for MemorySource {
    fn recv(&mut self, buf: &mut [u8]) -> Result<Recv, CaptureError> {
        match self.frames.pop_front() {
            Some(frame) => {
                let len = frame.len().min(buf.len());
                buf[..len].copy_from_slice(&frame[..len]);
                Ok(Recv::Frame(len))
            }
            None => Ok(Recv::Eof),
        }
    }

    fn link_protocol(&self) -> &'static str {
        self.link_protocol.unwrap_or(ETHERNET)
    }
}

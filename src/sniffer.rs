//! Observer fan-out for decoded frames.
//!
//! A [`PacketSniffer`] holds any number of [`Observer`]s. Starting a
//! capture returns a [`Frames`] iterator; every frame it yields has
//! already been handed to each observer, in registration order.

use crate::capture::{CaptureConfig, CaptureSource, PcapSource, StopSignal};
use crate::decoder::{DecodedFrame, DecoderStats, FrameDecoder, SessionError};
use crate::protocol::ProtocolRegistry;
use pcap::{Active, Offline};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// A consumer notified once per decoded frame.
pub trait Observer {
    fn update(&mut self, frame: &DecodedFrame);
}

/// Lets one observer be registered several times, or inspected by its
/// owner after the capture.
impl<O: Observer + ?Sized> Observer for Rc<RefCell<O>> {
    fn update(&mut self, frame: &DecodedFrame) {
        self.borrow_mut().update(frame);
    }
}

pub struct PacketSniffer {
    observers: Vec<Box<dyn Observer>>,
    registry: ProtocolRegistry,
    capture: CaptureConfig,
    stop: StopSignal,
}

impl Default for PacketSniffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketSniffer {
    pub fn new() -> Self {
        PacketSniffer {
            observers: Vec::new(),
            registry: ProtocolRegistry::builtin(),
            capture: CaptureConfig::default(),
            stop: StopSignal::new(),
        }
    }

    /// Decode with `registry` instead of the built-in protocol set.
    pub fn with_registry(mut self, registry: ProtocolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Base settings for live captures; the interface passed to
    /// [`PacketSniffer::start`] takes precedence.
    pub fn with_capture_config(mut self, capture: CaptureConfig) -> Self {
        self.capture = capture;
        self
    }

    /// Flag checked before every blocking read; triggering it ends the
    /// capture with [`SessionError::Interrupted`].
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Add an observer. Duplicates are notified once per registration.
    pub fn register(&mut self, observer: impl Observer + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Capture live on `interface`, or on every interface when `None`.
    ///
    /// Fails before any frame is produced if the capture cannot be opened.
    pub fn start(
        &mut self,
        interface: Option<&str>,
    ) -> Result<Frames<'_, PcapSource<Active>>, SessionError> {
        let config = CaptureConfig {
            interface: interface.map(str::to_owned).or_else(|| self.capture.interface.clone()),
            ..self.capture.clone()
        };
        let source = PcapSource::live(&config)?;
        Ok(self.listen(source))
    }

    /// Replay a pcap savefile through the decoder and observers.
    pub fn replay(&mut self, path: &Path) -> Result<Frames<'_, PcapSource<Offline>>, SessionError> {
        let source = PcapSource::open_file(path)?;
        Ok(self.listen(source))
    }

    /// Decode frames from any capture source.
    pub fn listen<S: CaptureSource>(&mut self, source: S) -> Frames<'_, S> {
        let decoder =
            FrameDecoder::new(source, self.registry.clone()).with_stop_signal(self.stop.clone());
        Frames {
            decoder,
            observers: &mut self.observers,
        }
    }
}

/// Decoded frames, each already delivered to every observer.
pub struct Frames<'a, S> {
    decoder: FrameDecoder<S>,
    observers: &'a mut [Box<dyn Observer>],
}

impl<S> Frames<'_, S> {
    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Release the capture source early.
    pub fn close(&mut self) {
        self.decoder.close();
    }
}

impl<S: CaptureSource> Iterator for Frames<'_, S> {
    type Item = Result<DecodedFrame, SessionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = match self.decoder.next()? {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e)),
        };
        for observer in self.observers.iter_mut() {
            observer.update(&frame);
        }
        Some(Ok(frame))
    }
}

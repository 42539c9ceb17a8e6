//! Frame decoder: the capture loop and the protocol-chain walk.
//!
//! Each captured frame is decoded by starting at the source's link-layer
//! protocol and asking every decoded layer which protocol it carries. The
//! chain grows one name at a time until a layer reports no further
//! encapsulation; whatever follows the last consumed header is the payload.
//!
//! ```text
//! raw:  | Ethernet (14) | IPv4 (20) | TCP (20) | payload ... |
//!        ^cursor=0       ^14         ^34        ^54
//! ```

use crate::capture::{CaptureError, CaptureSource, Recv, StopSignal, MAX_FRAME_LEN};
use crate::protocol::{Layer, ParseError, ProtocolRegistry};

/// One successfully decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Sequence number of this frame among those yielded, starting at 1.
    pub number: u64,
    /// Decoded layers in encapsulation order, keyed by protocol name.
    pub layers: Vec<(&'static str, Layer)>,
    /// Bytes following the last consumed header.
    pub payload: Vec<u8>,
}

impl DecodedFrame {
    pub fn layer(&self, protocol: &str) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|(name, _)| *name == protocol)
            .map(|(_, layer)| layer)
    }

    /// Protocol names in encapsulation order.
    pub fn protocols(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.layers.iter().map(|(name, _)| *name)
    }
}

/// Why a single frame could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("{protocol} header needs bytes up to offset {needed}, frame has {available}")]
    Truncated {
        protocol: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("malformed {protocol} header: {source}")]
    Decode {
        protocol: &'static str,
        #[source]
        source: ParseError,
    },
    #[error("no decoder registered for protocol '{0}'")]
    UnknownProtocol(&'static str),
}

impl FrameError {
    /// Fatal errors point at the registry, not at the traffic, and end the
    /// session instead of dropping one frame.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::UnknownProtocol(_))
    }
}

/// Errors that end a capture session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no decoder registered for protocol '{0}'")]
    UnknownProtocol(&'static str),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("capture interrupted")]
    Interrupted,
}

/// Counters over the life of one decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames read from the source.
    pub captured: u64,
    /// Frames decoded and yielded.
    pub decoded: u64,
    /// Frames dropped for truncation or bad headers.
    pub dropped: u64,
}

/// Walk the protocol chain of one raw frame.
///
/// Returns the decoded layers in order and the undecoded remainder.
pub fn decode_chain<'a>(
    registry: &ProtocolRegistry,
    root: &'static str,
    raw: &'a [u8],
) -> Result<(Vec<(&'static str, Layer)>, &'a [u8]), FrameError> {
    let mut chain = vec![root];
    let mut layers = Vec::new();
    let mut cursor = 0;
    let mut next = 0;

    while next < chain.len() {
        let protocol = chain[next];
        next += 1;

        let descriptor = registry
            .get(protocol)
            .ok_or(FrameError::UnknownProtocol(protocol))?;

        let end = cursor + descriptor.header_len();
        let window = raw.get(cursor..end).ok_or(FrameError::Truncated {
            protocol,
            needed: end,
            available: raw.len(),
        })?;
        let layer = descriptor
            .decode(window)
            .map_err(|source| FrameError::Decode { protocol, source })?;

        let encapsulated = layer.next_protocol();
        layers.push((protocol, layer));
        cursor = end;

        // A protocol already in the chain (stacked VLAN tags, say) ends the
        // walk; its bytes stay in the payload so layer names remain unique.
        match encapsulated {
            Some(name) if chain.contains(&name) => {
                tracing::trace!(protocol = name, "protocol repeats, stopping chain walk");
            }
            Some(name) => chain.push(name),
            None => {}
        }
    }

    Ok((layers, &raw[cursor..]))
}

/// Owns one capture source and turns its frames into [`DecodedFrame`]s.
///
/// Iterating yields frames until the source is exhausted, a fatal error
/// occurs, or the stop signal fires. Malformed frames are logged, counted
/// and skipped. The source is released when iteration ends or the decoder
/// is dropped.
pub struct FrameDecoder<S> {
    source: Option<S>,
    registry: ProtocolRegistry,
    root: &'static str,
    buffer: Vec<u8>,
    packet_num: u64,
    stats: DecoderStats,
    stop: StopSignal,
}

impl<S: CaptureSource> FrameDecoder<S> {
    pub fn new(source: S, registry: ProtocolRegistry) -> Self {
        let root = source.link_protocol();
        FrameDecoder {
            source: Some(source),
            registry,
            root,
            buffer: vec![0u8; MAX_FRAME_LEN],
            packet_num: 0,
            stats: DecoderStats::default(),
            stop: StopSignal::new(),
        }
    }

    /// Observe `stop` before every blocking read.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Capture and decode until one frame can be yielded.
    ///
    /// `Ok(None)` means the session is over.
    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>, SessionError> {
        loop {
            let Some(source) = self.source.as_mut() else {
                return Ok(None);
            };
            if self.stop.is_triggered() {
                self.close();
                return Err(SessionError::Interrupted);
            }

            let len = match source.recv(&mut self.buffer) {
                Ok(Recv::Frame(len)) => len,
                Ok(Recv::Idle) => continue,
                Ok(Recv::Eof) => {
                    tracing::debug!("capture source exhausted");
                    self.close();
                    return Ok(None);
                }
                Err(e) => {
                    tracing::error!(error = %e, "capture error");
                    self.close();
                    return Err(e.into());
                }
            };
            self.stats.captured += 1;

            let outcome = decode_chain(&self.registry, self.root, &self.buffer[..len])
                .map(|(layers, payload)| (layers, payload.to_vec()));
            match outcome {
                Ok((layers, payload)) => {
                    self.packet_num += 1;
                    self.stats.decoded += 1;
                    return Ok(Some(DecodedFrame {
                        number: self.packet_num,
                        layers,
                        payload,
                    }));
                }
                Err(FrameError::UnknownProtocol(protocol)) => {
                    tracing::error!(protocol, "protocol chain left the registry");
                    self.close();
                    return Err(SessionError::UnknownProtocol(protocol));
                }
                Err(e) => {
                    self.stats.dropped += 1;
                    tracing::warn!(
                        captured = self.stats.captured,
                        len,
                        error = %e,
                        "dropping malformed frame"
                    );
                }
            }
        }
    }
}

impl<S> FrameDecoder<S> {
    pub fn root_protocol(&self) -> &'static str {
        self.root
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// Release the capture source. Safe to call more than once.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            tracing::debug!(
                captured = self.stats.captured,
                decoded = self.stats.decoded,
                dropped = self.stats.dropped,
                "capture source released"
            );
        }
    }
}

impl<S: CaptureSource> Iterator for FrameDecoder<S> {
    type Item = Result<DecodedFrame, SessionError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

impl<S> Drop for FrameDecoder<S> {
    fn drop(&mut self) {
        self.close();
    }
}

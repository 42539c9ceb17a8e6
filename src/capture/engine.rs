//! libpcap-backed capture source, live or replayed from a savefile.

use super::{CaptureSource, Recv};
use crate::protocol::{ETHERNET, SLL};
use pcap::{Activated, Active, Capture, Device, Linktype, Offline};
use std::path::Path;

/// Largest frame handed to the decoder; longer frames are truncated.
pub const MAX_FRAME_LEN: usize = 9000;

/// libpcap pseudo-device that captures on every interface at once.
const ANY_DEVICE: &str = "any";

/// Errors from the capture engine.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Failed to find a suitable network device.
    #[error("no capture device: {0}")]
    NoDevice(String),
    /// The capture delivers frames whose outer header we cannot decode.
    #[error("unsupported link type: {0}")]
    UnsupportedLinkType(String),
    #[error("pcap error: {0}")]
    Pcap(#[from] pcap::Error),
}

/// Configuration for opening a live capture.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Interface to bind; `None` captures on all interfaces.
    pub interface: Option<String>,
    pub timeout_ms: i32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            interface: None,
            timeout_ms: 100,
        }
    }
}

/// List all available network interfaces.
pub fn list_interfaces() -> Result<Vec<Device>, CaptureError> {
    Ok(Device::list()?)
}

/// A pcap handle yielding raw frames. The handle is closed on drop.
pub struct PcapSource<T: Activated> {
    cap: Capture<T>,
    link_protocol: &'static str,
}

impl PcapSource<Active> {
    /// Open a live, promiscuous capture with the given configuration.
    pub fn live(config: &CaptureConfig) -> Result<Self, CaptureError> {
        let device = match &config.interface {
            Some(name) => Device::list()?
                .into_iter()
                .find(|d| d.name == *name)
                .ok_or_else(|| CaptureError::NoDevice(format!("interface '{}' not found", name)))?,
            None => Device::from(ANY_DEVICE),
        };
        let device_name = device.name.clone();

        let cap = Capture::from_device(device)?
            .promisc(true)
            .snaplen(MAX_FRAME_LEN as i32)
            .timeout(config.timeout_ms)
            .open()?;
        let link_protocol = link_protocol_for(cap.get_datalink())?;

        tracing::info!(
            interface = %device_name,
            link = link_protocol,
            snaplen = MAX_FRAME_LEN,
            "capture started"
        );

        Ok(PcapSource { cap, link_protocol })
    }
}

impl PcapSource<Offline> {
    /// Replay frames from a pcap savefile.
    pub fn open_file(path: &Path) -> Result<Self, CaptureError> {
        let cap = Capture::from_file(path)?;
        let link_protocol = link_protocol_for(cap.get_datalink())?;

        tracing::info!(
            file = %path.display(),
            link = link_protocol,
            "replay started"
        );

        Ok(PcapSource { cap, link_protocol })
    }
}

fn link_protocol_for(linktype: Linktype) -> Result<&'static str, CaptureError> {
    match linktype {
        Linktype::ETHERNET => Ok(ETHERNET),
        Linktype::LINUX_SLL => Ok(SLL),
        other => Err(CaptureError::UnsupportedLinkType(
            other
                .get_name()
                .unwrap_or_else(|_| format!("DLT {}", other.0)),
        )),
    }
}

impl<T: Activated> CaptureSource for PcapSource<T> {
    fn recv(&mut self, buf: &mut [u8]) -> Result<Recv, CaptureError> {
        match self.cap.next_packet() {
            Ok(packet) => {
                let len = packet.data.len().min(buf.len());
                buf[..len].copy_from_slice(&packet.data[..len]);
                Ok(Recv::Frame(len))
            }
            Err(pcap::Error::TimeoutExpired) => Ok(Recv::Idle),
            Err(pcap::Error::NoMorePackets) => Ok(Recv::Eof),
            Err(e) => Err(e.into()),
        }
    }

    fn link_protocol(&self) -> &'static str {
        self.link_protocol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_link_types_map_to_root_protocols() {
        assert_eq!(link_protocol_for(Linktype::ETHERNET).unwrap(), ETHERNET);
        assert_eq!(link_protocol_for(Linktype::LINUX_SLL).unwrap(), SLL);
    }

    #[test]
    fn other_link_types_are_rejected() {
        assert!(matches!(
            link_protocol_for(Linktype::IEEE802_11),
            Err(CaptureError::UnsupportedLinkType(_))
        ));
    }

    #[test]
    fn default_config_captures_everywhere() {
        let config = CaptureConfig::default();
        assert!(config.interface.is_none());
        assert_eq!(config.timeout_ms, 100);
    }
}

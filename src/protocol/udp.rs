//! UDP header decoder.
//!
//! UDP header layout (8 bytes, fixed):
//!   0                   1                   2                   3
//!   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |          Source Port          |       Destination Port        |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |            Length             |           Checksum            |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

use super::{take_header, Layer, ParseError, ProtocolDescriptor, UDP};
use std::fmt;

/// UDP header is always exactly 8 bytes.
pub const UDP_HEADER_LEN: usize = 8;

pub const DESCRIPTOR: ProtocolDescriptor = ProtocolDescriptor::new(UDP, UDP_HEADER_LEN, decode);

fn decode(data: &[u8]) -> Result<Layer, ParseError> {
    UdpHeader::parse(data).map(Layer::Udp)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpHeader {
    data: [u8; UDP_HEADER_LEN],
}

impl UdpHeader {
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        Ok(UdpHeader {
            data: take_header(data)?,
        })
    }

    #[inline]
    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes([self.data[0], self.data[1]])
    }

    #[inline]
    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    /// Total length of UDP datagram (header + payload) in bytes.
    #[inline]
    pub fn length(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    #[inline]
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.data[6], self.data[7]])
    }
}

impl fmt::Display for UdpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ":{} -> :{} len={}",
            self.src_port(),
            self.dst_port(),
            self.length()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_udp() {
        let pkt = [0x00, 0x35, 0xC0, 0x00, 0x00, 0x1C, 0x12, 0x34];
        let hdr = UdpHeader::parse(&pkt).unwrap();
        assert_eq!(hdr.src_port(), 53);
        assert_eq!(hdr.dst_port(), 49152);
        assert_eq!(hdr.length(), 28);
        assert_eq!(hdr.checksum(), 0x1234);
        assert_eq!(hdr.to_string(), ":53 -> :49152 len=28");
    }

    #[test]
    fn reject_short_udp() {
        let pkt = [0u8; 7];
        assert!(UdpHeader::parse(&pkt).is_err());
    }
}

//! IPv6 fixed header decoder.
//!
//! IPv6 fixed header layout (40 bytes):
//!   0                   1                   2                   3
//!   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |Version| Traffic Class |           Flow Label                  |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |         Payload Length        |  Next Header  |   Hop Limit   |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                         Source Address                        |
//!  |                          (128 bits)                           |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                      Destination Address                      |
//!  |                          (128 bits)                           |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

use super::{take_header, IpProtocol, Layer, ParseError, ProtocolDescriptor, IPV6};
use std::fmt;
use std::net::Ipv6Addr;

/// IPv6 fixed header length
pub const IPV6_HEADER_LEN: usize = 40;

pub const DESCRIPTOR: ProtocolDescriptor = ProtocolDescriptor::new(IPV6, IPV6_HEADER_LEN, decode);

fn decode(data: &[u8]) -> Result<Layer, ParseError> {
    Ipv6Header::parse(data).map(Layer::Ipv6)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Header {
    data: [u8; IPV6_HEADER_LEN],
}

impl Ipv6Header {
    /// Parse an IPv6 header from a byte slice.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let data: [u8; IPV6_HEADER_LEN] = take_header(data)?;

        let version = (data[0] >> 4) & 0x0F;
        if version != 6 {
            return Err(ParseError::InvalidHeader(format!(
                "expected IPv6 (version 6), got version {}",
                version
            )));
        }

        Ok(Ipv6Header { data })
    }

    /// IP version (always 6).
    #[inline]
    pub fn version(&self) -> u8 {
        (self.data[0] >> 4) & 0x0F
    }

    /// Traffic class (8 bits).
    #[inline]
    pub fn traffic_class(&self) -> u8 {
        ((self.data[0] & 0x0F) << 4) | ((self.data[1] >> 4) & 0x0F)
    }

    /// Flow label (20 bits).
    #[inline]
    pub fn flow_label(&self) -> u32 {
        ((self.data[1] & 0x0F) as u32) << 16 | (self.data[2] as u32) << 8 | self.data[3] as u32
    }

    /// Payload length (not including the 40-byte fixed header).
    #[inline]
    pub fn payload_length(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    /// Next header protocol number. Extension headers are not followed.
    #[inline]
    pub fn next_header(&self) -> IpProtocol {
        IpProtocol::from(self.data[6])
    }

    #[inline]
    pub fn next_header_raw(&self) -> u8 {
        self.data[6]
    }

    /// Hop limit (analogous to IPv4 TTL).
    #[inline]
    pub fn hop_limit(&self) -> u8 {
        self.data[7]
    }

    #[inline]
    pub fn src_addr(&self) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&self.data[8..24]);
        Ipv6Addr::from(octets)
    }

    #[inline]
    pub fn dst_addr(&self) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&self.data[24..40]);
        Ipv6Addr::from(octets)
    }
}

impl fmt::Display for Ipv6Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} next_hdr={} hop_limit={} len={}",
            self.src_addr(),
            self.dst_addr(),
            self.next_header(),
            self.hop_limit(),
            self.payload_length()
        )
    }
}

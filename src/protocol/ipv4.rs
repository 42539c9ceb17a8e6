//! IPv4 header decoder.
//!
//! IPv4 header layout (20 bytes without options):
//!   0                   1                   2                   3
//!   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |Version|  IHL  |Type of Service|          Total Length         |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |         Identification        |Flags|      Fragment Offset    |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |  Time to Live |    Protocol   |         Header Checksum       |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                       Source Address                          |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                    Destination Address                        |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!
//! Only the fixed 20 bytes are consumed; options (IHL > 5) stay in the
//! bytes that follow.

use super::{take_header, IpProtocol, Layer, ParseError, ProtocolDescriptor, IPV4};
use std::fmt;
use std::net::Ipv4Addr;

/// Minimum IPv4 header length (no options)
pub const IPV4_MIN_HEADER_LEN: usize = 20;

pub const DESCRIPTOR: ProtocolDescriptor =
    ProtocolDescriptor::new(IPV4, IPV4_MIN_HEADER_LEN, decode);

fn decode(data: &[u8]) -> Result<Layer, ParseError> {
    Ipv4Header::parse(data).map(Layer::Ipv4)
}

/// Owned copy of the fixed IPv4 header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    data: [u8; IPV4_MIN_HEADER_LEN],
}

impl Ipv4Header {
    /// Parse an IPv4 header from a byte slice.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let data: [u8; IPV4_MIN_HEADER_LEN] = take_header(data)?;

        let version = (data[0] >> 4) & 0x0F;
        if version != 4 {
            return Err(ParseError::InvalidHeader(format!(
                "expected IPv4 (version 4), got version {}",
                version
            )));
        }

        let ihl = data[0] & 0x0F;
        if (ihl as usize) * 4 < IPV4_MIN_HEADER_LEN {
            return Err(ParseError::InvalidHeader(format!(
                "IHL too small: {} (min 5)",
                ihl
            )));
        }

        Ok(Ipv4Header { data })
    }

    /// IP version (always 4).
    #[inline]
    pub fn version(&self) -> u8 {
        (self.data[0] >> 4) & 0x0F
    }

    /// Internet Header Length in 32-bit words.
    #[inline]
    pub fn ihl(&self) -> u8 {
        self.data[0] & 0x0F
    }

    /// Header length in bytes as declared by IHL, options included.
    #[inline]
    pub fn header_len(&self) -> usize {
        self.ihl() as usize * 4
    }

    /// Differentiated Services Code Point (upper 6 bits of TOS).
    #[inline]
    pub fn dscp(&self) -> u8 {
        self.data[1] >> 2
    }

    /// Explicit Congestion Notification (lower 2 bits of TOS).
    #[inline]
    pub fn ecn(&self) -> u8 {
        self.data[1] & 0x03
    }

    /// Total length of the IP packet (header + payload) in bytes.
    #[inline]
    pub fn total_length(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    /// Identification field (used for fragmentation reassembly).
    #[inline]
    pub fn identification(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    /// Don't Fragment flag.
    #[inline]
    pub fn dont_fragment(&self) -> bool {
        (self.data[6] >> 6) & 1 == 1
    }

    /// More Fragments flag.
    #[inline]
    pub fn more_fragments(&self) -> bool {
        (self.data[6] >> 5) & 1 == 1
    }

    /// Fragment offset in 8-byte units.
    #[inline]
    pub fn fragment_offset(&self) -> u16 {
        u16::from_be_bytes([self.data[6] & 0x1F, self.data[7]])
    }

    /// Time to Live.
    #[inline]
    pub fn ttl(&self) -> u8 {
        self.data[8]
    }

    /// Protocol number.
    #[inline]
    pub fn protocol(&self) -> IpProtocol {
        IpProtocol::from(self.data[9])
    }

    /// Protocol number as raw u8.
    #[inline]
    pub fn protocol_raw(&self) -> u8 {
        self.data[9]
    }

    /// Header checksum.
    #[inline]
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.data[10], self.data[11]])
    }

    /// Source IP address.
    #[inline]
    pub fn src_addr(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.data[12], self.data[13], self.data[14], self.data[15])
    }

    /// Destination IP address.
    #[inline]
    pub fn dst_addr(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.data[16], self.data[17], self.data[18], self.data[19])
    }

    /// Verify the header checksum.
    /// `None` when the header carries options, which are not held here.
    pub fn verify_checksum(&self) -> Option<bool> {
        if self.header_len() != IPV4_MIN_HEADER_LEN {
            return None;
        }
        let mut sum: u32 = 0;
        for i in (0..IPV4_MIN_HEADER_LEN).step_by(2) {
            sum += u16::from_be_bytes([self.data[i], self.data[i + 1]]) as u32;
        }
        // Fold carry bits
        while sum >> 16 != 0 {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
        Some(sum == 0xFFFF)
    }
}

impl fmt::Display for Ipv4Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} proto={} ttl={} len={}",
            self.src_addr(),
            self.dst_addr(),
            self.protocol(),
            self.ttl(),
            self.total_length()
        )
    }
}

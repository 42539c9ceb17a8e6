//! ICMP / ICMPv6 header decoder.
//!
//! ICMP header layout (8 bytes):
//!   0                   1                   2                   3
//!   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |     Type      |     Code      |          Checksum             |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                     Rest of Header                           |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

use super::{take_header, Layer, ParseError, ProtocolDescriptor, ICMP, ICMPV6};
use std::fmt;

pub const ICMP_HEADER_LEN: usize = 8;

pub const DESCRIPTOR: ProtocolDescriptor = ProtocolDescriptor::new(ICMP, ICMP_HEADER_LEN, decode);

/// ICMPv6 shares the ICMP header shape; only the type numbering differs.
pub const V6_DESCRIPTOR: ProtocolDescriptor =
    ProtocolDescriptor::new(ICMPV6, ICMP_HEADER_LEN, decode_v6);

fn decode(data: &[u8]) -> Result<Layer, ParseError> {
    IcmpHeader::parse(data).map(Layer::Icmp)
}

fn decode_v6(data: &[u8]) -> Result<Layer, ParseError> {
    IcmpHeader::parse_v6(data).map(Layer::Icmp)
}

/// Common ICMP types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpType {
    EchoReply,
    DestinationUnreachable,
    Redirect,
    EchoRequest,
    TimeExceeded,
    Unknown(u8),
}

impl From<u8> for IcmpType {
    fn from(value: u8) -> Self {
        match value {
            0 => IcmpType::EchoReply,
            3 => IcmpType::DestinationUnreachable,
            5 => IcmpType::Redirect,
            8 => IcmpType::EchoRequest,
            11 => IcmpType::TimeExceeded,
            other => IcmpType::Unknown(other),
        }
    }
}

impl fmt::Display for IcmpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IcmpType::EchoReply => write!(f, "Echo Reply"),
            IcmpType::DestinationUnreachable => write!(f, "Destination Unreachable"),
            IcmpType::Redirect => write!(f, "Redirect"),
            IcmpType::EchoRequest => write!(f, "Echo Request"),
            IcmpType::TimeExceeded => write!(f, "Time Exceeded"),
            IcmpType::Unknown(v) => write!(f, "Type({})", v),
        }
    }
}

/// ICMPv6 types (RFC 4443, RFC 4861)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icmpv6Type {
    DestinationUnreachable,
    PacketTooBig,
    TimeExceeded,
    ParameterProblem,
    EchoRequest,
    EchoReply,
    RouterSolicitation,
    RouterAdvertisement,
    NeighborSolicitation,
    NeighborAdvertisement,
    Unknown(u8),
}

impl From<u8> for Icmpv6Type {
    fn from(value: u8) -> Self {
        match value {
            1 => Icmpv6Type::DestinationUnreachable,
            2 => Icmpv6Type::PacketTooBig,
            3 => Icmpv6Type::TimeExceeded,
            4 => Icmpv6Type::ParameterProblem,
            128 => Icmpv6Type::EchoRequest,
            129 => Icmpv6Type::EchoReply,
            133 => Icmpv6Type::RouterSolicitation,
            134 => Icmpv6Type::RouterAdvertisement,
            135 => Icmpv6Type::NeighborSolicitation,
            136 => Icmpv6Type::NeighborAdvertisement,
            other => Icmpv6Type::Unknown(other),
        }
    }
}

impl fmt::Display for Icmpv6Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Icmpv6Type::DestinationUnreachable => write!(f, "Destination Unreachable"),
            Icmpv6Type::PacketTooBig => write!(f, "Packet Too Big"),
            Icmpv6Type::TimeExceeded => write!(f, "Time Exceeded"),
            Icmpv6Type::ParameterProblem => write!(f, "Parameter Problem"),
            Icmpv6Type::EchoRequest => write!(f, "Echo Request"),
            Icmpv6Type::EchoReply => write!(f, "Echo Reply"),
            Icmpv6Type::RouterSolicitation => write!(f, "Router Solicitation"),
            Icmpv6Type::RouterAdvertisement => write!(f, "Router Advertisement"),
            Icmpv6Type::NeighborSolicitation => write!(f, "Neighbor Solicitation"),
            Icmpv6Type::NeighborAdvertisement => write!(f, "Neighbor Advertisement"),
            Icmpv6Type::Unknown(v) => write!(f, "Type({})", v),
        }
    }
}

/// ICMP or ICMPv6 header; `v6` selects the type numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpHeader {
    data: [u8; ICMP_HEADER_LEN],
    v6: bool,
}

impl IcmpHeader {
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        Ok(IcmpHeader {
            data: take_header(data)?,
            v6: false,
        })
    }

    pub fn parse_v6(data: &[u8]) -> Result<Self, ParseError> {
        Ok(IcmpHeader {
            data: take_header(data)?,
            v6: true,
        })
    }

    #[inline]
    pub fn is_v6(&self) -> bool {
        self.v6
    }

    /// ICMPv4 type. Meaningless for ICMPv6 headers; see [`Self::icmpv6_type`].
    #[inline]
    pub fn icmp_type(&self) -> IcmpType {
        IcmpType::from(self.data[0])
    }

    #[inline]
    pub fn icmpv6_type(&self) -> Icmpv6Type {
        Icmpv6Type::from(self.data[0])
    }

    /// Type name for the header's own numbering, with the raw number in
    /// parentheses when the type is recognised.
    pub fn type_label(&self) -> String {
        let raw = self.icmp_type_raw();
        if self.v6 {
            match self.icmpv6_type() {
                Icmpv6Type::Unknown(_) => self.icmpv6_type().to_string(),
                known => format!("{} ({})", known, raw),
            }
        } else {
            match self.icmp_type() {
                IcmpType::Unknown(_) => self.icmp_type().to_string(),
                known => format!("{} ({})", known, raw),
            }
        }
    }

    fn is_echo(&self) -> bool {
        if self.v6 {
            matches!(
                self.icmpv6_type(),
                Icmpv6Type::EchoRequest | Icmpv6Type::EchoReply
            )
        } else {
            matches!(self.icmp_type(), IcmpType::EchoRequest | IcmpType::EchoReply)
        }
    }

    #[inline]
    pub fn icmp_type_raw(&self) -> u8 {
        self.data[0]
    }

    #[inline]
    pub fn code(&self) -> u8 {
        self.data[1]
    }

    #[inline]
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    /// For Echo Request/Reply: identifier.
    #[inline]
    pub fn identifier(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    /// For Echo Request/Reply: sequence number.
    #[inline]
    pub fn sequence(&self) -> u16 {
        u16::from_be_bytes([self.data[6], self.data[7]])
    }
}

impl fmt::Display for IcmpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.v6 {
            self.icmpv6_type().to_string()
        } else {
            self.icmp_type().to_string()
        };
        if self.is_echo() {
            write!(f, "{} id={} seq={}", name, self.identifier(), self.sequence())
        } else {
            write!(f, "{} code={}", name, self.code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_echo_request() {
        let pkt = [8, 0, 0, 0, 0x00, 0x01, 0x00, 0x0A];
        let hdr = IcmpHeader::parse(&pkt).unwrap();
        assert_eq!(hdr.icmp_type(), IcmpType::EchoRequest);
        assert_eq!(hdr.code(), 0);
        assert_eq!(hdr.identifier(), 1);
        assert_eq!(hdr.sequence(), 10);
        assert_eq!(hdr.to_string(), "Echo Request id=1 seq=10");
    }

    #[test]
    fn v6_descriptor_uses_icmpv6_numbering() {
        let echo = V6_DESCRIPTOR.decode(&[128, 0, 0, 0, 0x00, 0x07, 0x00, 0x01]).unwrap();
        let Layer::Icmp(echo) = echo else {
            panic!("expected an ICMP layer");
        };
        assert!(echo.is_v6());
        assert_eq!(echo.icmpv6_type(), Icmpv6Type::EchoRequest);
        assert_eq!(echo.type_label(), "Echo Request (128)");
        assert_eq!(echo.to_string(), "Echo Request id=7 seq=1");

        let expired = V6_DESCRIPTOR.decode(&[3, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let Layer::Icmp(expired) = expired else {
            panic!("expected an ICMP layer");
        };
        assert_eq!(expired.type_label(), "Time Exceeded (3)");
        assert_eq!(expired.to_string(), "Time Exceeded code=0");
        assert_eq!(V6_DESCRIPTOR.name(), ICMPV6);
    }

    #[test]
    fn v4_labels_stay_on_the_v4_table() {
        let hdr = IcmpHeader::parse(&[3, 1, 0, 0, 0, 0, 0, 0]).unwrap();
        assert!(!hdr.is_v6());
        assert_eq!(hdr.type_label(), "Destination Unreachable (3)");
    }

    #[test]
    fn unknown_types_print_the_number_once() {
        assert_eq!(IcmpHeader::parse(&[42, 0, 0, 0, 0, 0, 0, 0]).unwrap().type_label(), "Type(42)");
        assert_eq!(IcmpHeader::parse_v6(&[200, 0, 0, 0, 0, 0, 0, 0]).unwrap().type_label(), "Type(200)");
    }

    #[test]
    fn reject_short_icmp() {
        let pkt = [0u8; 7];
        assert!(IcmpHeader::parse(&pkt).is_err());
    }
}

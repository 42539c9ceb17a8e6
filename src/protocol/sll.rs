//! Linux cooked capture (SLL) header decoder.
//!
//! libpcap hands out these 16-byte pseudo headers instead of Ethernet
//! headers when capturing on the `any` device:
//!   - Packet type:        2 bytes (0 = to us, 4 = outgoing, ...)
//!   - ARPHRD type:        2 bytes
//!   - Link addr length:   2 bytes
//!   - Link addr:          8 bytes (zero padded)
//!   - Protocol:           2 bytes (EtherType)

use super::{ethernet, take_header, EtherType, Layer, ParseError, ProtocolDescriptor, SLL};
use std::fmt;

pub const SLL_HEADER_LEN: usize = 16;

pub const DESCRIPTOR: ProtocolDescriptor = ProtocolDescriptor::new(SLL, SLL_HEADER_LEN, decode);

fn decode(data: &[u8]) -> Result<Layer, ParseError> {
    SllHeader::parse(data).map(Layer::Sll)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Host,
    Broadcast,
    Multicast,
    OtherHost,
    Outgoing,
    Unknown(u16),
}

impl From<u16> for PacketType {
    fn from(value: u16) -> Self {
        match value {
            0 => PacketType::Host,
            1 => PacketType::Broadcast,
            2 => PacketType::Multicast,
            3 => PacketType::OtherHost,
            4 => PacketType::Outgoing,
            other => PacketType::Unknown(other),
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketType::Host => write!(f, "In"),
            PacketType::Broadcast => write!(f, "B"),
            PacketType::Multicast => write!(f, "M"),
            PacketType::OtherHost => write!(f, "P"),
            PacketType::Outgoing => write!(f, "Out"),
            PacketType::Unknown(v) => write!(f, "Type({})", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SllHeader {
    data: [u8; SLL_HEADER_LEN],
}

impl SllHeader {
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let data: [u8; SLL_HEADER_LEN] = take_header(data)?;
        let addr_len = u16::from_be_bytes([data[4], data[5]]);
        if addr_len > 8 {
            return Err(ParseError::InvalidHeader(format!(
                "SLL link address length {} exceeds 8",
                addr_len
            )));
        }
        Ok(SllHeader { data })
    }

    #[inline]
    pub fn packet_type(&self) -> PacketType {
        PacketType::from(u16::from_be_bytes([self.data[0], self.data[1]]))
    }

    #[inline]
    pub fn arphrd_type(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    /// Link-layer source address, trimmed to its declared length.
    #[inline]
    pub fn link_addr(&self) -> &[u8] {
        let len = u16::from_be_bytes([self.data[4], self.data[5]]) as usize;
        &self.data[6..6 + len]
    }

    #[inline]
    pub fn ether_type(&self) -> EtherType {
        EtherType::from(u16::from_be_bytes([self.data[14], self.data[15]]))
    }
}

impl fmt::Display for SllHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr = self.link_addr();
        if addr.len() == 6 {
            write!(
                f,
                "{} {} [{}]",
                self.packet_type(),
                ethernet::format_mac(addr),
                self.ether_type()
            )
        } else {
            write!(f, "{} [{}]", self.packet_type(), self.ether_type())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_sll_header() -> Vec<u8> {
        let mut hdr = vec![0u8; 16];
        hdr[1] = 4; // outgoing
        hdr[3] = 1; // ARPHRD_ETHER
        hdr[5] = 6;
        hdr[6..12].copy_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        hdr[14] = 0x86;
        hdr[15] = 0xDD;
        hdr
    }

    #[test]
    fn parse_outgoing_ipv6() {
        let hdr = SllHeader::parse(&make_sll_header()).unwrap();
        assert_eq!(hdr.packet_type(), PacketType::Outgoing);
        assert_eq!(hdr.arphrd_type(), 1);
        assert_eq!(hdr.link_addr(), &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(hdr.ether_type(), EtherType::Ipv6);
        assert_eq!(hdr.to_string(), "Out 00:11:22:33:44:55 [IPv6]");
    }

    #[test]
    fn reject_oversized_address() {
        let mut hdr = make_sll_header();
        hdr[5] = 9;
        assert!(SllHeader::parse(&hdr).is_err());
    }
}

//! ARP decoder for Ethernet/IPv4 address resolution (28 bytes).
//!
//!   - Hardware type:  2 bytes
//!   - Protocol type:  2 bytes
//!   - HW addr len:    1 byte  (6)
//!   - Proto addr len: 1 byte  (4)
//!   - Operation:      2 bytes
//!   - Sender MAC/IP:  6 + 4 bytes
//!   - Target MAC/IP:  6 + 4 bytes

use super::{take_header, Layer, ParseError, ProtocolDescriptor, ARP};
use std::fmt;
use std::net::Ipv4Addr;

pub const ARP_PACKET_LEN: usize = 28;

pub const DESCRIPTOR: ProtocolDescriptor = ProtocolDescriptor::new(ARP, ARP_PACKET_LEN, decode);

fn decode(data: &[u8]) -> Result<Layer, ParseError> {
    ArpPacket::parse(data).map(Layer::Arp)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOperation {
    Request,
    Reply,
    Unknown(u16),
}

impl From<u16> for ArpOperation {
    fn from(value: u16) -> Self {
        match value {
            1 => ArpOperation::Request,
            2 => ArpOperation::Reply,
            other => ArpOperation::Unknown(other),
        }
    }
}

impl fmt::Display for ArpOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArpOperation::Request => write!(f, "Request"),
            ArpOperation::Reply => write!(f, "Reply"),
            ArpOperation::Unknown(v) => write!(f, "Op({})", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpPacket {
    data: [u8; ARP_PACKET_LEN],
}

impl ArpPacket {
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let data: [u8; ARP_PACKET_LEN] = take_header(data)?;
        if data[4] != 6 || data[5] != 4 {
            return Err(ParseError::InvalidHeader(format!(
                "unsupported ARP address lengths: hw={} proto={}",
                data[4], data[5]
            )));
        }
        Ok(ArpPacket { data })
    }

    #[inline]
    pub fn hardware_type(&self) -> u16 {
        u16::from_be_bytes([self.data[0], self.data[1]])
    }

    #[inline]
    pub fn protocol_type(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    #[inline]
    pub fn operation(&self) -> ArpOperation {
        ArpOperation::from(u16::from_be_bytes([self.data[6], self.data[7]]))
    }

    #[inline]
    pub fn sender_mac(&self) -> &[u8] {
        &self.data[8..14]
    }

    #[inline]
    pub fn sender_ip(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.data[14], self.data[15], self.data[16], self.data[17])
    }

    #[inline]
    pub fn target_mac(&self) -> &[u8] {
        &self.data[18..24]
    }

    #[inline]
    pub fn target_ip(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.data[24], self.data[25], self.data[26], self.data[27])
    }
}

impl fmt::Display for ArpPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation() {
            ArpOperation::Request => {
                write!(f, "who-has {} tell {}", self.target_ip(), self.sender_ip())
            }
            ArpOperation::Reply => write!(
                f,
                "{} is-at {}",
                self.sender_ip(),
                super::ethernet::format_mac(self.sender_mac())
            ),
            op => write!(f, "{} {} -> {}", op, self.sender_ip(), self.target_ip()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_arp_request() -> Vec<u8> {
        let mut pkt = vec![0u8; 28];
        pkt[0..2].copy_from_slice(&1u16.to_be_bytes()); // Ethernet
        pkt[2..4].copy_from_slice(&0x0800u16.to_be_bytes()); // IPv4
        pkt[4] = 6;
        pkt[5] = 4;
        pkt[6..8].copy_from_slice(&1u16.to_be_bytes()); // request
        pkt[8..14].copy_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        pkt[14..18].copy_from_slice(&[192, 168, 1, 10]);
        pkt[24..28].copy_from_slice(&[192, 168, 1, 1]);
        pkt
    }

    #[test]
    fn parse_request() {
        let arp = ArpPacket::parse(&make_arp_request()).unwrap();
        assert_eq!(arp.hardware_type(), 1);
        assert_eq!(arp.protocol_type(), 0x0800);
        assert_eq!(arp.operation(), ArpOperation::Request);
        assert_eq!(arp.sender_ip(), Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(arp.target_ip(), Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(arp.to_string(), "who-has 192.168.1.1 tell 192.168.1.10");
    }

    #[test]
    fn reject_non_ethernet_ipv4_lengths() {
        let mut pkt = make_arp_request();
        pkt[4] = 8;
        assert!(matches!(
            ArpPacket::parse(&pkt),
            Err(ParseError::InvalidHeader(_))
        ));
    }
}

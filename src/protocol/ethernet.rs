//! Ethernet II header decoder.
//!
//! An Ethernet frame has the following layout:
//!   - Destination MAC: 6 bytes
//!   - Source MAC:      6 bytes
//!   - EtherType:       2 bytes
//!   - Payload:         variable (46-1500 bytes typically)
//!
//! Total header size: 14 bytes. 802.1Q tags are decoded as their own layer.

use super::{take_header, EtherType, Layer, ParseError, ProtocolDescriptor, ETHERNET};
use std::fmt;

/// Ethernet header length (no VLAN tags)
pub const ETH_HEADER_LEN: usize = 14;

pub const DESCRIPTOR: ProtocolDescriptor = ProtocolDescriptor::new(ETHERNET, ETH_HEADER_LEN, decode);

fn decode(data: &[u8]) -> Result<Layer, ParseError> {
    EthernetHeader::parse(data).map(Layer::Ethernet)
}

/// Owned copy of an Ethernet header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetHeader {
    data: [u8; ETH_HEADER_LEN],
}

impl EthernetHeader {
    /// Parse an Ethernet header from the start of a raw byte slice.
    /// Returns an error if there aren't enough bytes.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        Ok(EthernetHeader {
            data: take_header(data)?,
        })
    }

    /// Destination MAC address as a 6-byte slice.
    #[inline]
    pub fn dst_mac(&self) -> &[u8] {
        &self.data[0..6]
    }

    /// Source MAC address as a 6-byte slice.
    #[inline]
    pub fn src_mac(&self) -> &[u8] {
        &self.data[6..12]
    }

    /// EtherType field.
    #[inline]
    pub fn ether_type(&self) -> EtherType {
        EtherType::from(self.ether_type_raw())
    }

    /// Raw EtherType as u16.
    #[inline]
    pub fn ether_type_raw(&self) -> u16 {
        u16::from_be_bytes([self.data[12], self.data[13]])
    }
}

/// Format a MAC address as xx:xx:xx:xx:xx:xx
pub fn format_mac(mac: &[u8]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

impl fmt::Display for EthernetHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{}]",
            format_mac(self.src_mac()),
            format_mac(self.dst_mac()),
            self.ether_type()
        )
    }
}

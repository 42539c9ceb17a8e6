//! 802.1Q VLAN tag decoder.
//!
//! The 4 bytes following an Ethernet header whose EtherType is 0x8100:
//!   - TCI:       2 bytes (PCP 3 bits, DEI 1 bit, VID 12 bits)
//!   - EtherType: 2 bytes (the encapsulated protocol)

use super::{take_header, EtherType, Layer, ParseError, ProtocolDescriptor, VLAN};
use std::fmt;

pub const VLAN_TAG_LEN: usize = 4;

pub const DESCRIPTOR: ProtocolDescriptor = ProtocolDescriptor::new(VLAN, VLAN_TAG_LEN, decode);

fn decode(data: &[u8]) -> Result<Layer, ParseError> {
    VlanTag::parse(data).map(Layer::Vlan)
}

/// VLAN tag (802.1Q)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanTag {
    data: [u8; VLAN_TAG_LEN],
}

impl VlanTag {
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        Ok(VlanTag {
            data: take_header(data)?,
        })
    }

    #[inline]
    fn tci(&self) -> u16 {
        u16::from_be_bytes([self.data[0], self.data[1]])
    }

    /// Priority code point.
    #[inline]
    pub fn priority(&self) -> u8 {
        (self.tci() >> 13) as u8
    }

    /// Drop eligible indicator.
    #[inline]
    pub fn dei(&self) -> bool {
        (self.tci() >> 12) & 1 == 1
    }

    #[inline]
    pub fn vlan_id(&self) -> u16 {
        self.tci() & 0x0FFF
    }

    /// EtherType of the tagged payload.
    #[inline]
    pub fn ether_type(&self) -> EtherType {
        EtherType::from(u16::from_be_bytes([self.data[2], self.data[3]]))
    }
}

impl fmt::Display for VlanTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vid={} pcp={} [{}]",
            self.vlan_id(),
            self.priority(),
            self.ether_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tagged_ipv4() {
        // PCP=5, DEI=0, VID=100, inner EtherType IPv4
        let tag = VlanTag::parse(&[0xA0, 0x64, 0x08, 0x00]).unwrap();
        assert_eq!(tag.priority(), 5);
        assert!(!tag.dei());
        assert_eq!(tag.vlan_id(), 100);
        assert_eq!(tag.ether_type(), EtherType::Ipv4);
        assert_eq!(decode(&[0xA0, 0x64, 0x08, 0x00]).unwrap().next_protocol(), Some(crate::protocol::IPV4));
    }

    #[test]
    fn reject_short_tag() {
        assert!(VlanTag::parse(&[0x00, 0x01, 0x08]).is_err());
    }
}

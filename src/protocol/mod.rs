//! Protocol registry and the decoded-layer sum type.
//!
//! Every protocol the decoder can walk is described by a
//! [`ProtocolDescriptor`]: a name, a fixed header length, and a decode
//! function turning exactly `header_len` bytes into a [`Layer`]. A layer
//! names the protocol it encapsulates (if any), which is how the decoder
//! discovers the next link of the chain.

pub mod arp;
pub mod ethernet;
pub mod icmp;
pub mod ipv4;
pub mod ipv6;
pub mod sll;
pub mod tcp;
pub mod udp;
pub mod vlan;

use std::collections::HashMap;
use std::fmt;

pub const ETHERNET: &str = "Ethernet";
pub const SLL: &str = "Linux SLL";
pub const VLAN: &str = "802.1Q";
pub const ARP: &str = "ARP";
pub const IPV4: &str = "IPv4";
pub const IPV6: &str = "IPv6";
pub const TCP: &str = "TCP";
pub const UDP: &str = "UDP";
pub const ICMP: &str = "ICMP";
pub const ICMPV6: &str = "ICMPv6";

/// EtherType constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Ipv6,
    Arp,
    VlanTagged,
    Unknown(u16),
}

impl From<u16> for EtherType {
    fn from(value: u16) -> Self {
        match value {
            0x0800 => EtherType::Ipv4,
            0x86DD => EtherType::Ipv6,
            0x0806 => EtherType::Arp,
            0x8100 => EtherType::VlanTagged,
            other => EtherType::Unknown(other),
        }
    }
}

impl EtherType {
    pub fn as_u16(&self) -> u16 {
        match self {
            EtherType::Ipv4 => 0x0800,
            EtherType::Ipv6 => 0x86DD,
            EtherType::Arp => 0x0806,
            EtherType::VlanTagged => 0x8100,
            EtherType::Unknown(v) => *v,
        }
    }

    /// Registry name of the protocol carried under this EtherType.
    pub fn protocol_name(&self) -> Option<&'static str> {
        match self {
            EtherType::Ipv4 => Some(IPV4),
            EtherType::Ipv6 => Some(IPV6),
            EtherType::Arp => Some(ARP),
            EtherType::VlanTagged => Some(VLAN),
            EtherType::Unknown(_) => None,
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::Ipv4 => write!(f, "IPv4"),
            EtherType::Ipv6 => write!(f, "IPv6"),
            EtherType::Arp => write!(f, "ARP"),
            EtherType::VlanTagged => write!(f, "802.1Q VLAN"),
            EtherType::Unknown(v) => write!(f, "Unknown(0x{:04x})", v),
        }
    }
}

/// IP Protocol numbers (subset relevant to our use case)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Icmp,
    Tcp,
    Udp,
    Icmpv6,
    Unknown(u8),
}

impl From<u8> for IpProtocol {
    fn from(value: u8) -> Self {
        match value {
            1 => IpProtocol::Icmp,
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            58 => IpProtocol::Icmpv6,
            other => IpProtocol::Unknown(other),
        }
    }
}

impl IpProtocol {
    /// Registry name of the transport carried under this protocol number.
    pub fn protocol_name(&self) -> Option<&'static str> {
        match self {
            IpProtocol::Icmp => Some(ICMP),
            IpProtocol::Tcp => Some(TCP),
            IpProtocol::Udp => Some(UDP),
            IpProtocol::Icmpv6 => Some(ICMPV6),
            IpProtocol::Unknown(_) => None,
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpProtocol::Icmp => write!(f, "ICMP"),
            IpProtocol::Tcp => write!(f, "TCP"),
            IpProtocol::Udp => write!(f, "UDP"),
            IpProtocol::Icmpv6 => write!(f, "ICMPv6"),
            IpProtocol::Unknown(v) => write!(f, "Proto({})", v),
        }
    }
}

/// Errors from protocol parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Not enough bytes to parse the header
    #[error("packet too short: need {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    /// Invalid header values
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

/// Copy the first `N` bytes of `data` into an owned header buffer.
pub(crate) fn take_header<const N: usize>(data: &[u8]) -> Result<[u8; N], ParseError> {
    if data.len() < N {
        return Err(ParseError::TooShort {
            expected: N,
            actual: data.len(),
        });
    }
    let mut header = [0u8; N];
    header.copy_from_slice(&data[..N]);
    Ok(header)
}

/// `"TCP (6)"` for known protocol numbers, `"Proto(47)"` alone otherwise.
fn with_raw(protocol: IpProtocol, raw: u8) -> String {
    match protocol {
        IpProtocol::Unknown(_) => protocol.to_string(),
        known => format!("{} ({})", known, raw),
    }
}

/// One decoded protocol header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    Ethernet(ethernet::EthernetHeader),
    Sll(sll::SllHeader),
    Vlan(vlan::VlanTag),
    Arp(arp::ArpPacket),
    Ipv4(ipv4::Ipv4Header),
    Ipv6(ipv6::Ipv6Header),
    Tcp(tcp::TcpHeader),
    Udp(udp::UdpHeader),
    Icmp(icmp::IcmpHeader),
}

impl Layer {
    /// Name of the encapsulated protocol, or `None` when this layer is the
    /// last one the registry can follow.
    pub fn next_protocol(&self) -> Option<&'static str> {
        match self {
            Layer::Ethernet(h) => h.ether_type().protocol_name(),
            Layer::Sll(h) => h.ether_type().protocol_name(),
            Layer::Vlan(h) => h.ether_type().protocol_name(),
            Layer::Ipv4(h) => h.protocol().protocol_name(),
            Layer::Ipv6(h) => h.next_header().protocol_name(),
            Layer::Arp(_) | Layer::Tcp(_) | Layer::Udp(_) | Layer::Icmp(_) => None,
        }
    }

    /// Labelled, human-readable header fields in wire order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Layer::Ethernet(h) => vec![
                ("Source", ethernet::format_mac(h.src_mac())),
                ("Destination", ethernet::format_mac(h.dst_mac())),
                (
                    "EtherType",
                    match h.ether_type() {
                        EtherType::Unknown(_) => h.ether_type().to_string(),
                        known => format!("{} (0x{:04x})", known, h.ether_type_raw()),
                    },
                ),
            ],
            Layer::Sll(h) => vec![
                ("Packet Type", h.packet_type().to_string()),
                ("ARPHRD", h.arphrd_type().to_string()),
                (
                    "Link Address",
                    h.link_addr()
                        .iter()
                        .map(|b| format!("{:02x}", b))
                        .collect::<Vec<_>>()
                        .join(":"),
                ),
                ("EtherType", h.ether_type().to_string()),
            ],
            Layer::Vlan(h) => vec![
                ("VLAN ID", h.vlan_id().to_string()),
                ("Priority", h.priority().to_string()),
                ("DEI", h.dei().to_string()),
                ("EtherType", h.ether_type().to_string()),
            ],
            Layer::Arp(h) => vec![
                ("Operation", h.operation().to_string()),
                ("Sender MAC", ethernet::format_mac(h.sender_mac())),
                ("Sender IP", h.sender_ip().to_string()),
                ("Target MAC", ethernet::format_mac(h.target_mac())),
                ("Target IP", h.target_ip().to_string()),
            ],
            Layer::Ipv4(h) => vec![
                ("Source", h.src_addr().to_string()),
                ("Destination", h.dst_addr().to_string()),
                ("Protocol", with_raw(h.protocol(), h.protocol_raw())),
                ("TTL", h.ttl().to_string()),
                ("Total Length", h.total_length().to_string()),
                ("ID", format!("0x{:04x}", h.identification())),
                (
                    "Flags",
                    format!("DF={} MF={}", h.dont_fragment(), h.more_fragments()),
                ),
                ("Fragment Offset", h.fragment_offset().to_string()),
                (
                    "Checksum",
                    match h.verify_checksum() {
                        Some(true) => format!("0x{:04x} (valid)", h.checksum()),
                        Some(false) => format!("0x{:04x} (invalid)", h.checksum()),
                        None => format!("0x{:04x}", h.checksum()),
                    },
                ),
            ],
            Layer::Ipv6(h) => vec![
                ("Source", h.src_addr().to_string()),
                ("Destination", h.dst_addr().to_string()),
                ("Next Header", with_raw(h.next_header(), h.next_header_raw())),
                ("Hop Limit", h.hop_limit().to_string()),
                ("Payload Length", h.payload_length().to_string()),
                ("Traffic Class", h.traffic_class().to_string()),
                ("Flow Label", format!("0x{:05x}", h.flow_label())),
            ],
            Layer::Tcp(h) => vec![
                ("Source Port", h.src_port().to_string()),
                ("Destination Port", h.dst_port().to_string()),
                ("Sequence", h.sequence_number().to_string()),
                ("Acknowledgment", h.ack_number().to_string()),
                ("Flags", h.flags_string()),
                ("Window", h.window_size().to_string()),
                ("Checksum", format!("0x{:04x}", h.checksum())),
            ],
            Layer::Udp(h) => vec![
                ("Source Port", h.src_port().to_string()),
                ("Destination Port", h.dst_port().to_string()),
                ("Length", h.length().to_string()),
                ("Checksum", format!("0x{:04x}", h.checksum())),
            ],
            Layer::Icmp(h) => vec![
                ("Type", h.type_label()),
                ("Code", h.code().to_string()),
                ("Checksum", format!("0x{:04x}", h.checksum())),
            ],
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Ethernet(h) => fmt::Display::fmt(h, f),
            Layer::Sll(h) => fmt::Display::fmt(h, f),
            Layer::Vlan(h) => fmt::Display::fmt(h, f),
            Layer::Arp(h) => fmt::Display::fmt(h, f),
            Layer::Ipv4(h) => fmt::Display::fmt(h, f),
            Layer::Ipv6(h) => fmt::Display::fmt(h, f),
            Layer::Tcp(h) => fmt::Display::fmt(h, f),
            Layer::Udp(h) => fmt::Display::fmt(h, f),
            Layer::Icmp(h) => fmt::Display::fmt(h, f),
        }
    }
}

/// Decode exactly one header window into a layer.
pub type DecodeFn = fn(&[u8]) -> Result<Layer, ParseError>;

/// How to decode one named protocol.
#[derive(Clone, Copy)]
pub struct ProtocolDescriptor {
    name: &'static str,
    header_len: usize,
    decode: DecodeFn,
}

impl ProtocolDescriptor {
    pub const fn new(name: &'static str, header_len: usize, decode: DecodeFn) -> Self {
        ProtocolDescriptor {
            name,
            header_len,
            decode,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of bytes this protocol's header occupies in the frame.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Layer, ParseError> {
        (self.decode)(bytes)
    }
}

impl fmt::Debug for ProtocolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolDescriptor")
            .field("name", &self.name)
            .field("header_len", &self.header_len)
            .finish()
    }
}

/// Protocol name -> descriptor lookup consulted by the frame decoder.
#[derive(Debug, Clone, Default)]
pub struct ProtocolRegistry {
    protocols: HashMap<&'static str, ProtocolDescriptor>,
}

impl ProtocolRegistry {
    /// An empty registry. Most callers want [`ProtocolRegistry::builtin`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every protocol this crate knows how to decode.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ethernet::DESCRIPTOR);
        registry.register(sll::DESCRIPTOR);
        registry.register(vlan::DESCRIPTOR);
        registry.register(arp::DESCRIPTOR);
        registry.register(ipv4::DESCRIPTOR);
        registry.register(ipv6::DESCRIPTOR);
        registry.register(tcp::DESCRIPTOR);
        registry.register(udp::DESCRIPTOR);
        registry.register(icmp::DESCRIPTOR);
        registry.register(icmp::V6_DESCRIPTOR);
        registry
    }

    /// Add or replace the descriptor registered under `descriptor.name()`.
    pub fn register(&mut self, descriptor: ProtocolDescriptor) -> Option<ProtocolDescriptor> {
        self.protocols.insert(descriptor.name, descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&ProtocolDescriptor> {
        self.protocols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.protocols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_covers_every_next_protocol() {
        let registry = ProtocolRegistry::builtin();
        let names = [
            EtherType::Ipv4.protocol_name(),
            EtherType::Ipv6.protocol_name(),
            EtherType::Arp.protocol_name(),
            EtherType::VlanTagged.protocol_name(),
            IpProtocol::Tcp.protocol_name(),
            IpProtocol::Udp.protocol_name(),
            IpProtocol::Icmp.protocol_name(),
            IpProtocol::Icmpv6.protocol_name(),
        ];
        for name in names.into_iter().flatten() {
            assert!(registry.contains(name), "{} missing from registry", name);
        }
        assert!(registry.contains(ETHERNET));
        assert!(registry.contains(SLL));
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn unknown_numbers_are_terminal() {
        assert_eq!(EtherType::from(0x88cc).protocol_name(), None);
        assert_eq!(IpProtocol::from(47).protocol_name(), None);
    }

    #[test]
    fn register_replaces_existing_descriptor() {
        fn always_udp(bytes: &[u8]) -> Result<Layer, ParseError> {
            udp::UdpHeader::parse(bytes).map(Layer::Udp)
        }

        let mut registry = ProtocolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.register(tcp::DESCRIPTOR).is_none());
        let previous = registry.register(ProtocolDescriptor::new(TCP, 8, always_udp));
        assert_eq!(previous.map(|d| d.header_len()), Some(20));
        assert_eq!(registry.get(TCP).map(|d| d.header_len()), Some(8));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn descriptor_decodes_through_its_function() {
        let mut window = [0u8; 14];
        window[12] = 0x08;
        let layer = ethernet::DESCRIPTOR.decode(&window).unwrap();
        assert_eq!(layer.next_protocol(), Some(IPV4));
        assert_eq!(ethernet::DESCRIPTOR.name(), ETHERNET);
        assert_eq!(ethernet::DESCRIPTOR.header_len(), 14);
    }

    #[test]
    fn unknown_numbers_are_printed_once() {
        let mut ip = [0u8; 20];
        ip[0] = 0x45;
        ip[9] = 47;
        let fields = ipv4::DESCRIPTOR.decode(&ip).unwrap().fields();
        assert!(fields.contains(&("Protocol", "Proto(47)".to_string())));

        ip[9] = 6;
        let fields = ipv4::DESCRIPTOR.decode(&ip).unwrap().fields();
        assert!(fields.contains(&("Protocol", "TCP (6)".to_string())));

        let mut eth = [0u8; 14];
        eth[12..14].copy_from_slice(&0x88ccu16.to_be_bytes());
        let fields = ethernet::DESCRIPTOR.decode(&eth).unwrap().fields();
        assert!(fields.contains(&("EtherType", "Unknown(0x88cc)".to_string())));
    }

    #[test]
    fn layer_fields_are_labelled() {
        let mut window = [0u8; 8];
        window[1] = 53;
        let layer = udp::DESCRIPTOR.decode(&window).unwrap();
        let fields = layer.fields();
        assert_eq!(fields[0], ("Source Port", "53".to_string()));
        assert_eq!(layer.next_protocol(), None);
    }
}

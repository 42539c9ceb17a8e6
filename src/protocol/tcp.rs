//! TCP header decoder.
//!
//! TCP header layout (20 bytes without options):
//!   0                   1                   2                   3
//!   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |          Source Port          |       Destination Port        |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                        Sequence Number                       |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                    Acknowledgment Number                     |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |  Data |           |U|A|P|R|S|F|                               |
//!  | Offset| Reserved  |R|C|S|S|Y|I|            Window             |
//!  |       |           |G|K|H|T|N|N|                               |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |           Checksum            |         Urgent Pointer        |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

use super::{take_header, Layer, ParseError, ProtocolDescriptor, TCP};
use std::fmt;

/// Minimum TCP header length (no options)
pub const TCP_MIN_HEADER_LEN: usize = 20;

pub const DESCRIPTOR: ProtocolDescriptor = ProtocolDescriptor::new(TCP, TCP_MIN_HEADER_LEN, decode);

fn decode(data: &[u8]) -> Result<Layer, ParseError> {
    TcpHeader::parse(data).map(Layer::Tcp)
}

/// TCP flags bitmask constants
pub mod flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpHeader {
    data: [u8; TCP_MIN_HEADER_LEN],
}

impl TcpHeader {
    /// Parse a TCP header from a byte slice.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let data: [u8; TCP_MIN_HEADER_LEN] = take_header(data)?;

        let data_offset = (data[12] >> 4) & 0x0F;
        if (data_offset as usize) * 4 < TCP_MIN_HEADER_LEN {
            return Err(ParseError::InvalidHeader(format!(
                "TCP data offset too small: {} (min 5)",
                data_offset
            )));
        }

        Ok(TcpHeader { data })
    }

    #[inline]
    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes([self.data[0], self.data[1]])
    }

    #[inline]
    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    #[inline]
    pub fn sequence_number(&self) -> u32 {
        u32::from_be_bytes([self.data[4], self.data[5], self.data[6], self.data[7]])
    }

    #[inline]
    pub fn ack_number(&self) -> u32 {
        u32::from_be_bytes([self.data[8], self.data[9], self.data[10], self.data[11]])
    }

    /// Data offset in 32-bit words.
    #[inline]
    pub fn data_offset(&self) -> u8 {
        (self.data[12] >> 4) & 0x0F
    }

    /// Declared header length in bytes, options included.
    #[inline]
    pub fn header_len(&self) -> usize {
        self.data_offset() as usize * 4
    }

    #[inline]
    pub fn flags_raw(&self) -> u8 {
        self.data[13]
    }

    #[inline]
    pub fn fin(&self) -> bool {
        self.data[13] & flags::FIN != 0
    }

    #[inline]
    pub fn syn(&self) -> bool {
        self.data[13] & flags::SYN != 0
    }

    #[inline]
    pub fn rst(&self) -> bool {
        self.data[13] & flags::RST != 0
    }

    #[inline]
    pub fn psh(&self) -> bool {
        self.data[13] & flags::PSH != 0
    }

    #[inline]
    pub fn ack(&self) -> bool {
        self.data[13] & flags::ACK != 0
    }

    #[inline]
    pub fn urg(&self) -> bool {
        self.data[13] & flags::URG != 0
    }

    /// Format flags as a string like "[SYN, ACK]".
    pub fn flags_string(&self) -> String {
        let names = [
            (self.syn(), "SYN"),
            (self.ack(), "ACK"),
            (self.fin(), "FIN"),
            (self.rst(), "RST"),
            (self.psh(), "PSH"),
            (self.urg(), "URG"),
        ];
        let parts: Vec<&str> = names
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, name)| *name)
            .collect();
        format!("[{}]", parts.join(", "))
    }

    #[inline]
    pub fn window_size(&self) -> u16 {
        u16::from_be_bytes([self.data[14], self.data[15]])
    }

    #[inline]
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.data[16], self.data[17]])
    }

    #[inline]
    pub fn urgent_pointer(&self) -> u16 {
        u16::from_be_bytes([self.data[18], self.data[19]])
    }
}

impl fmt::Display for TcpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ":{} -> :{} {} seq={} ack={} win={}",
            self.src_port(),
            self.dst_port(),
            self.flags_string(),
            self.sequence_number(),
            self.ack_number(),
            self.window_size()
        )
    }
}

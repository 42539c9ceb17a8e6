//! Frame display for the CLI.
//!
//! Two observers: [`ScreenOutput`] prints human-readable summaries with an
//! optional payload hex dump, [`JsonLinesOutput`] writes one JSON object
//! per frame.

use crate::decoder::DecodedFrame;
use crate::sniffer::Observer;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::io::{self, Stdout, Write};

/// Payload bytes shown in a hex dump before eliding the rest.
const HEX_DUMP_LIMIT: usize = 256;

/// Prints a one-line summary per frame followed by each layer's fields.
pub struct ScreenOutput<W: Write = Stdout> {
    out: W,
    display_data: bool,
}

impl ScreenOutput<Stdout> {
    pub fn new(display_data: bool) -> Self {
        Self::with_writer(io::stdout(), display_data)
    }
}

impl<W: Write> ScreenOutput<W> {
    pub fn with_writer(out: W, display_data: bool) -> Self {
        ScreenOutput { out, display_data }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, frame: &DecodedFrame) -> io::Result<()> {
        writeln!(self.out, "{}", format_summary(frame))?;
        for (protocol, layer) in &frame.layers {
            writeln!(self.out, "  {}:", protocol)?;
            for (name, value) in layer.fields() {
                writeln!(self.out, "    {:<14}{}", format!("{}:", name), value)?;
            }
        }
        if self.display_data && !frame.payload.is_empty() {
            writeln!(self.out, "  Data ({} bytes):", frame.payload.len())?;
            self.out.write_all(format_hex_dump(&frame.payload).as_bytes())?;
        }
        self.out.flush()
    }
}

impl<W: Write> Observer for ScreenOutput<W> {
    fn update(&mut self, frame: &DecodedFrame) {
        if let Err(e) = self.write_frame(frame) {
            tracing::warn!(packet = frame.number, error = %e, "failed to print frame");
        }
    }
}

/// Writes one JSON object per frame, newline-delimited.
pub struct JsonLinesOutput<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesOutput<W> {
    pub fn new(out: W) -> Self {
        JsonLinesOutput { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, frame: &DecodedFrame) -> io::Result<()> {
        let record = FrameRecord::from(frame);
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> Observer for JsonLinesOutput<W> {
    fn update(&mut self, frame: &DecodedFrame) {
        if let Err(e) = self.write_frame(frame) {
            tracing::warn!(packet = frame.number, error = %e, "failed to write JSON record");
        }
    }
}

#[derive(Serialize)]
struct FrameRecord {
    packet: u64,
    layers: Vec<LayerRecord>,
    payload_len: usize,
    payload: String,
}

#[derive(Serialize)]
struct LayerRecord {
    protocol: &'static str,
    fields: Fields,
}

/// Layer fields as a JSON object, keys in decode order.
struct Fields(Vec<(&'static str, String)>);

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl From<&DecodedFrame> for FrameRecord {
    fn from(frame: &DecodedFrame) -> Self {
        FrameRecord {
            packet: frame.number,
            layers: frame
                .layers
                .iter()
                .map(|(protocol, layer)| LayerRecord {
                    protocol: *protocol,
                    fields: Fields(layer.fields()),
                })
                .collect(),
            payload_len: frame.payload.len(),
            payload: frame.payload.iter().map(|b| format!("{:02x}", b)).collect(),
        }
    }
}

/// `#<n> <proto> > <proto> ... | <innermost header> | payload: N bytes`
pub fn format_summary(frame: &DecodedFrame) -> String {
    let chain: Vec<&str> = frame.protocols().collect();
    let mut summary = format!("#{:<6} {}", frame.number, chain.join(" > "));

    if let Some((_, innermost)) = frame.layers.last() {
        summary.push_str(&format!(" | {}", innermost));
    }
    if !frame.payload.is_empty() {
        summary.push_str(&format!(" | payload: {} bytes", frame.payload.len()));
    }
    summary
}

/// Offset, hex bytes and ASCII columns, 16 bytes per line.
pub fn format_hex_dump(data: &[u8]) -> String {
    let display_len = data.len().min(HEX_DUMP_LIMIT);
    let mut out = String::new();

    for offset in (0..display_len).step_by(16) {
        let end = (offset + 16).min(display_len);
        let chunk = &data[offset..end];

        out.push_str(&format!("    {:04x}  ", offset));

        for (i, byte) in chunk.iter().enumerate() {
            out.push_str(&format!("{:02x} ", byte));
            if i == 7 {
                out.push(' ');
            }
        }
        for i in chunk.len()..16 {
            out.push_str("   ");
            if i == 7 {
                out.push(' ');
            }
        }

        out.push_str(" |");
        for byte in chunk {
            if byte.is_ascii_graphic() || *byte == b' ' {
                out.push(*byte as char);
            } else {
                out.push('.');
            }
        }
        out.push_str("|\n");
    }

    if display_len < data.len() {
        out.push_str(&format!(
            "    ... ({} bytes remaining)\n",
            data.len() - display_len
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ethernet, ipv4, udp, Layer, ETHERNET, IPV4, UDP};

    fn sample_frame(payload: &[u8]) -> DecodedFrame {
        let mut eth = [0u8; 14];
        eth[12] = 0x08;
        let mut ip = [0u8; 20];
        ip[0] = 0x45;
        ip[9] = 17;
        ip[12..16].copy_from_slice(&[10, 0, 0, 1]);
        ip[16..20].copy_from_slice(&[10, 0, 0, 2]);
        let mut udp_hdr = [0u8; 8];
        udp_hdr[0..2].copy_from_slice(&5353u16.to_be_bytes());
        udp_hdr[2..4].copy_from_slice(&53u16.to_be_bytes());

        DecodedFrame {
            number: 7,
            layers: vec![
                (ETHERNET, Layer::Ethernet(ethernet::EthernetHeader::parse(&eth).unwrap())),
                (IPV4, Layer::Ipv4(ipv4::Ipv4Header::parse(&ip).unwrap())),
                (UDP, Layer::Udp(udp::UdpHeader::parse(&udp_hdr).unwrap())),
            ],
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn summary_lists_the_chain() {
        let line = format_summary(&sample_frame(b"hello"));
        assert!(line.starts_with("#7"));
        assert!(line.contains("Ethernet > IPv4 > UDP"));
        assert!(line.ends_with("payload: 5 bytes"));
    }

    #[test]
    fn screen_output_hides_data_unless_asked() {
        let frame = sample_frame(b"hello");

        let mut plain = ScreenOutput::with_writer(Vec::new(), false);
        plain.update(&frame);
        let text = String::from_utf8(plain.into_inner()).unwrap();
        assert!(text.contains("  UDP:"));
        assert!(!text.contains("|hello|"));

        let mut with_data = ScreenOutput::with_writer(Vec::new(), true);
        with_data.update(&frame);
        let text = String::from_utf8(with_data.into_inner()).unwrap();
        assert!(text.contains("Data (5 bytes):"));
        assert!(text.contains("|hello|"));
    }

    #[test]
    fn json_lines_one_object_per_frame() {
        let mut out = JsonLinesOutput::new(Vec::new());
        out.update(&sample_frame(&[0xde, 0xad]));
        out.update(&sample_frame(&[]));
        let text = String::from_utf8(out.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["packet"], 7);
        assert_eq!(first["payload_len"], 2);
        assert_eq!(first["payload"], "dead");
        assert_eq!(first["layers"][1]["protocol"], "IPv4");
        assert_eq!(first["layers"].as_array().unwrap().len(), 3);
        assert!(first["layers"][2]["fields"].is_object());
    }

    #[test]
    fn hex_dump_elides_past_limit() {
        let dump = format_hex_dump(&[0x41u8; 300]);
        assert_eq!(dump.lines().count(), 17);
        assert!(dump.contains("(44 bytes remaining)"));
        assert!(dump.starts_with("    0000  41 41"));
    }

    #[test]
    fn hex_dump_pads_short_lines() {
        let dump = format_hex_dump(b"ab");
        assert!(dump.ends_with("|ab|\n"));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_do_not_panic() {
        let mut out = JsonLinesOutput::new(FailingWriter);
        out.update(&sample_frame(b"x"));
        let mut screen = ScreenOutput::with_writer(FailingWriter, true);
        screen.update(&sample_frame(b"x"));
    }
}

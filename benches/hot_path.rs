//! Criterion benchmarks for the netsniff hot path:
//! - `decode_chain` (protocol-chain walk over one frame)
//! - `FrameDecoder` iteration over an in-memory source

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use netsniff::capture::MemorySource;
use netsniff::protocol::ETHERNET;
use netsniff::{decode_chain, FrameDecoder, ProtocolRegistry};

/// Ethernet + IPv4 + TCP with `payload_len` bytes of data.
fn make_tcp_packet(payload_len: usize, flags: u8) -> Vec<u8> {
    let mut pkt = vec![0u8; 14 + 20 + 20 + payload_len];

    // Ethernet header
    pkt[0..6].copy_from_slice(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
    pkt[6..12].copy_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    pkt[12] = 0x08;
    pkt[13] = 0x00;

    // IPv4 header (20 bytes, no options)
    let ip_total = (20 + 20 + payload_len) as u16;
    let ip = &mut pkt[14..34];
    ip[0] = 0x45;
    ip[2..4].copy_from_slice(&ip_total.to_be_bytes());
    ip[6] = 0x40; // DF
    ip[8] = 64;
    ip[9] = 6; // TCP
    ip[12..16].copy_from_slice(&[192, 168, 1, 100]);
    ip[16..20].copy_from_slice(&[10, 0, 0, 1]);

    // TCP header (20 bytes, no options)
    let tcp = &mut pkt[34..54];
    tcp[0..2].copy_from_slice(&49152u16.to_be_bytes());
    tcp[2..4].copy_from_slice(&80u16.to_be_bytes());
    tcp[4..8].copy_from_slice(&1000u32.to_be_bytes());
    tcp[12] = 0x50;
    tcp[13] = flags;
    tcp[14..16].copy_from_slice(&65535u16.to_be_bytes());

    for (i, byte) in pkt[54..].iter_mut().enumerate() {
        *byte = (i % 256) as u8;
    }
    pkt
}

/// Ethernet + 802.1Q + IPv6 + UDP, four layers deep.
fn make_vlan_udp6_packet() -> Vec<u8> {
    let mut pkt = vec![0u8; 14 + 4 + 40 + 8 + 32];
    pkt[12..14].copy_from_slice(&0x8100u16.to_be_bytes());
    pkt[14..16].copy_from_slice(&100u16.to_be_bytes());
    pkt[16..18].copy_from_slice(&0x86DDu16.to_be_bytes());
    let ip = &mut pkt[18..58];
    ip[0] = 0x60;
    ip[4..6].copy_from_slice(&40u16.to_be_bytes());
    ip[6] = 17; // UDP
    ip[7] = 64;
    let udp = &mut pkt[58..66];
    udp[0..2].copy_from_slice(&5353u16.to_be_bytes());
    udp[2..4].copy_from_slice(&5353u16.to_be_bytes());
    udp[4..6].copy_from_slice(&40u16.to_be_bytes());
    pkt
}

fn bench_decode_chain(c: &mut Criterion) {
    let registry = ProtocolRegistry::builtin();
    let syn = make_tcp_packet(0, 0x02);
    let data = make_tcp_packet(1400, 0x18);
    let vlan = make_vlan_udp6_packet();

    let mut group = c.benchmark_group("decode_chain");
    group.throughput(Throughput::Elements(1));

    group.bench_function("tcp_syn_54B", |b| {
        b.iter(|| decode_chain(&registry, ETHERNET, black_box(&syn)))
    });

    group.bench_function("tcp_data_1454B", |b| {
        b.iter(|| decode_chain(&registry, ETHERNET, black_box(&data)))
    });

    group.bench_function("vlan_ipv6_udp", |b| {
        b.iter(|| decode_chain(&registry, ETHERNET, black_box(&vlan)))
    });

    group.finish();
}

fn bench_frame_decoder(c: &mut Criterion) {
    const FRAMES: usize = 1000;
    let frames: Vec<Vec<u8>> = (0..FRAMES)
        .map(|i| make_tcp_packet(i % 512, 0x18))
        .collect();

    let mut group = c.benchmark_group("frame_decoder");
    group.throughput(Throughput::Elements(FRAMES as u64));

    group.bench_function("memory_source_1000", |b| {
        b.iter_batched(
            || MemorySource::new(frames.clone()),
            |source| {
                let decoder = FrameDecoder::new(source, ProtocolRegistry::builtin());
                black_box(decoder.filter(Result::is_ok).count())
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_decode_chain, bench_frame_decoder);
criterion_main!(benches);

//! Benchmarks for the ADB header codec
//!
//! Measures header encode/decode and payload checksums at the sizes the
//! handshake actually sends (banner, 256-byte signature, full payload).

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use protocol::{HOST_BANNER, MAX_PAYLOAD, MessageHeader, checksum};

fn benchmark_header(c: &mut Criterion) {
    let mut group = c.benchmark_group("header");

    let header = MessageHeader::connect(HOST_BANNER);
    group.bench_function("encode_connect", |b| b.iter(|| black_box(&header).encode()));

    let bytes = header.encode();
    group.bench_function("decode_connect", |b| {
        b.iter(|| MessageHeader::decode(black_box(&bytes)))
    });

    group.finish();
}

fn benchmark_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");

    for size in [7usize, 256, MAX_PAYLOAD as usize] {
        let data = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| checksum(black_box(data)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_header, benchmark_checksum);
criterion_main!(benches);

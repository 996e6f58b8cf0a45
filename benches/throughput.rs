//! Throughput Benchmark for FlashStream
//!
//! This benchmark measures how fast a session drains its input buffer
//! through a handler, and the round trip through a real loopback server.

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flashstream::session::process_input;
use flashstream::{Endpoint, LineEcho, Server, TransportKind};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn pipelined_lines(count: usize, line_len: usize) -> Vec<u8> {
    let mut line = "x".repeat(line_len.saturating_sub(1)).into_bytes();
    line.push(b'\n');
    line.repeat(count)
}

/// Benchmark draining pipelined requests from one read
fn bench_pipelined(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipelined");

    for count in [1usize, 16, 256] {
        let payload = pipelined_lines(count, 64);
        group.throughput(Throughput::Bytes(payload.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &payload, |b, payload| {
            let mut handler = LineEcho::new();
            let mut input = BytesMut::with_capacity(payload.len());
            let mut output = BytesMut::with_capacity(payload.len());

            b.iter(|| {
                input.extend_from_slice(payload);
                let drained = process_input(&mut handler, &mut input, &mut output).unwrap();
                black_box(drained);
                output.clear();
            });
        });
    }

    group.finish();
}

/// Benchmark a request that arrives in two reads
fn bench_partial(c: &mut Criterion) {
    let payload = pipelined_lines(1, 1024);
    let (head, tail) = payload.split_at(payload.len() / 2);

    let mut group = c.benchmark_group("partial");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    group.bench_function("split_1kb_line", |b| {
        let mut handler = LineEcho::new();
        let mut input = BytesMut::with_capacity(payload.len());
        let mut output = BytesMut::with_capacity(payload.len());

        b.iter(|| {
            input.extend_from_slice(head);
            process_input(&mut handler, &mut input, &mut output).unwrap();
            input.extend_from_slice(tail);
            process_input(&mut handler, &mut input, &mut output).unwrap();
            black_box(&output);
            output.clear();
        });
    });

    group.finish();
}

/// Benchmark the round trip through a loopback TCP server
fn bench_loopback(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let (server, mut client) = runtime.block_on(async {
        let server = Server::builder()
            .endpoint(TransportKind::Tcp, "127.0.0.1:0")
            .handler_factory(LineEcho::new)
            .build()
            .unwrap();
        server.async_run();

        let addr = match server.local_endpoint() {
            Endpoint::Tcp(addr) => *addr,
            other => panic!("unexpected endpoint: {}", other),
        };
        let client = TcpStream::connect(addr).await.unwrap();
        (server, client)
    });

    let payload = pipelined_lines(16, 64);
    let mut reply = vec![0u8; payload.len()];

    let mut group = c.benchmark_group("loopback");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Bytes(payload.len() as u64));

    group.bench_function("echo_16_lines", |b| {
        b.iter(|| {
            runtime.block_on(async {
                client.write_all(&payload).await.unwrap();
                client.read_exact(&mut reply).await.unwrap();
            });
        });
    });

    group.finish();
    runtime.block_on(server.shutdown());
}

criterion_group!(benches, bench_pipelined, bench_partial, bench_loopback);

criterion_main!(benches);

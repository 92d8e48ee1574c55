use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use srcembed_perf::{Replay, pattern};
use srcembed_stream::{InputStream, StreamConfig, WaitPolicy};
use std::hint::black_box;

const TOTAL: u64 = 8 * 1024 * 1024;

fn drain(config: StreamConfig, read_size: usize) -> u64 {
    let source = Replay::new(pattern(4096), TOTAL);
    let mut input = InputStream::initialize(source, config).expect("initialize");
    let mut buf = vec![0u8; read_size];
    loop {
        let n = input.read(&mut buf).expect("read");
        if n == 0 {
            break;
        }
        black_box(&buf[..n]);
    }
    let total = input.bytes_read();
    input.dispose();
    total
}

fn bench_wait_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("input");
    group.throughput(Throughput::Bytes(TOTAL));
    group.sample_size(20);

    for half in [4 * 1024, 64 * 1024, 1024 * 1024] {
        for (label, wait) in [("spin", WaitPolicy::Spin), ("block", WaitPolicy::Block)] {
            let config = StreamConfig::new(half).with_wait(wait);
            group.bench_with_input(BenchmarkId::new(label, half), &config, |b, &config| {
                b.iter(|| drain(config, 16 * 1024));
            });
        }
    }
    group.finish();
}

fn bench_read_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("input_read_size");
    group.throughput(Throughput::Bytes(TOTAL));
    group.sample_size(20);

    for read_size in [1, 64, 4096, 65536] {
        group.bench_with_input(BenchmarkId::from_parameter(read_size), &read_size, |b, &n| {
            b.iter(|| drain(StreamConfig::default(), n));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_wait_policy, bench_read_size);
criterion_main!(benches);

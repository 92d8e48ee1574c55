use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use srcembed_perf::{Discard, pattern};
use srcembed_stream::{OutputStream, StreamConfig, WaitPolicy};

const TOTAL: usize = 8 * 1024 * 1024;

fn fill(config: StreamConfig, piece: &[u8]) {
    let mut out = OutputStream::initialize(Discard, config).expect("initialize");
    let mut written = 0;
    while written < TOTAL {
        out.write(piece).expect("write");
        written += piece.len();
    }
    out.dispose().expect("dispose");
}

fn bench_wait_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("output");
    group.throughput(Throughput::Bytes(TOTAL as u64));
    group.sample_size(20);

    let piece = pattern(16 * 1024);
    for half in [4 * 1024, 64 * 1024, 1024 * 1024] {
        for (label, wait) in [("spin", WaitPolicy::Spin), ("block", WaitPolicy::Block)] {
            let config = StreamConfig::new(half).with_wait(wait);
            group.bench_with_input(BenchmarkId::new(label, half), &config, |b, &config| {
                b.iter(|| fill(config, &piece));
            });
        }
    }
    group.finish();
}

fn bench_write_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("output_write_size");
    group.throughput(Throughput::Bytes(TOTAL as u64));
    group.sample_size(20);

    for size in [5, 64, 4096, 65536] {
        let piece = pattern(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &piece, |b, piece| {
            b.iter(|| fill(StreamConfig::default(), piece));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_wait_policy, bench_write_size);
criterion_main!(benches);

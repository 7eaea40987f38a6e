use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};
use wordfreq::{CountConfig, Counter};

fn build_corpus() -> Vec<u8> {
    let mut data = Vec::with_capacity(1 << 20);
    let mut state = 0x2545_f491_4f6c_dd1du64;
    while data.len() < 1 << 20 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        data.extend_from_slice(format!("word{}\n", state % 4096).as_bytes());
    }
    data
}

fn bench_counting(c: &mut Criterion) {
    let corpus = build_corpus();

    let mut group = c.benchmark_group("count_corpus");
    group.throughput(Throughput::Bytes(corpus.len() as u64));
    group.sampling_mode(SamplingMode::Flat);
    for workers in [1usize, 4, 16] {
        let cfg = CountConfig::builder()
            .workers(workers)
            .show_progress(false)
            .build()
            .expect("configuration");
        group.bench_function(BenchmarkId::new("MiB_1", workers), |b| {
            b.iter(|| {
                let artifacts = Counter::new(cfg.clone())
                    .count_source(&corpus)
                    .expect("counting");
                let _ = black_box(artifacts);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_counting);
criterion_main!(benches);

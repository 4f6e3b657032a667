//! Criterion benchmarks for Max-Cover attestation aggregation
//!
//! These benchmarks measure the greedy selection on committee-sized bitlists
//! across pool sizes, plus the bitlist primitives the rescore/filter passes
//! are built from.

use att_agg::{
    AggregationConfig, AggregationError, AggregationStrategy, Attestation, AttestationData,
    Bitfield, Bitlist, aggregate,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::hint::black_box;

// Mainnet target committee size
const COMMITTEE_SIZE: usize = 128;

/// Generate a pool of attestations where each bit is set with probability `density`
fn generate_pool(count: usize, density: f64, seed: u64) -> Vec<Attestation> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|i| {
            let mut bits = Bitlist::with_length(COMMITTEE_SIZE);
            for bit in 0..COMMITTEE_SIZE {
                if rng.random_bool(density) {
                    bits.set(bit, true);
                }
            }
            Attestation::new(bits, AttestationData::default(), vec![i as u8; 96])
        })
        .collect()
}

fn concat(signatures: &[&[u8]]) -> Result<Vec<u8>, AggregationError> {
    Ok(signatures.concat())
}

/// Benchmark: MaxCover over sparse pools (mostly single-member votes)
fn bench_max_cover_sparse(c: &mut Criterion) {
    let mut group = c.benchmark_group("max_cover_sparse");
    let config = AggregationConfig::default();

    for size in [16, 64, 256, 1024] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let pool = generate_pool(size, 0.02, 1);
            b.iter(|| {
                black_box(aggregate(pool.clone(), &config, &concat))
                    .expect("Aggregation should succeed")
            });
        });
    }

    group.finish();
}

/// Benchmark: MaxCover over dense, heavily overlapping pools
fn bench_max_cover_dense(c: &mut Criterion) {
    let mut group = c.benchmark_group("max_cover_dense");
    let config = AggregationConfig::default();

    for size in [16, 64, 256, 1024] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let pool = generate_pool(size, 0.3, 2);
            b.iter(|| {
                black_box(aggregate(pool.clone(), &config, &concat))
                    .expect("Aggregation should succeed")
            });
        });
    }

    group.finish();
}

/// Benchmark: Combined strategy with a round cap
fn bench_max_cover_combined_capped(c: &mut Criterion) {
    let mut group = c.benchmark_group("max_cover_combined_capped");
    let config = AggregationConfig::new(AggregationStrategy::MaxCoverCombined).with_max_rounds(16);

    for size in [64, 256, 1024] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let pool = generate_pool(size, 0.05, 3);
            b.iter(|| {
                black_box(aggregate(pool.clone(), &config, &concat))
                    .expect("Aggregation should succeed")
            });
        });
    }

    group.finish();
}

/// Benchmark: Bitlist primitives at committee size
fn bench_bitlist_ops(c: &mut Criterion) {
    let pool = generate_pool(2, 0.5, 4);
    let (a, b) = (&pool[0].aggregation_bits, &pool[1].aggregation_bits);

    c.bench_function("bitlist_and_count", |bench| {
        bench.iter(|| black_box(a).and(black_box(b)).count_ones());
    });
    c.bench_function("bitlist_overlaps", |bench| {
        bench.iter(|| black_box(a).overlaps(black_box(b)));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets =
        bench_max_cover_sparse,
        bench_max_cover_dense,
        bench_max_cover_combined_capped,
        bench_bitlist_ops,
}

criterion_main!(benches);

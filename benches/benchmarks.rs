use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use rapcol::model::binomial::BinomialTable;
use rapcol::model::combinations::Combinations;
use rapcol::model::intersection::Intersection;
use rapcol::data::column::Column;
use rapcol::data::entry::{Allele, Entry};

/// Benchmark cumulative mask enumeration at typical (coverage, k) points
fn bench_enumeration(c: &mut Criterion) {
    let table = BinomialTable::for_max_coverage();
    let mut group = c.benchmark_group("mask_enumeration");

    for (n, k) in [(10usize, 3usize), (20, 4), (32, 5)] {
        let total = table.cumulative(n, k);
        group.throughput(Throughput::Elements(total));

        group.bench_with_input(
            BenchmarkId::new("cumulative", format!("n{}_k{}", n, k)),
            &(n, k),
            |b, &(n, k)| {
                b.iter(|| {
                    let mut acc = 0u32;
                    for mask in Combinations::cumulative(black_box(n), black_box(k)) {
                        acc ^= mask.bits();
                    }
                    black_box(acc)
                })
            },
        );
    }

    group.finish();
}

/// Benchmark cumulative rank computation over a full enumeration
fn bench_ranking(c: &mut Criterion) {
    let table = BinomialTable::for_max_coverage();
    let mut group = c.benchmark_group("cumulative_rank");

    for (n, k) in [(20usize, 4usize), (32, 5)] {
        let masks: Vec<_> = Combinations::cumulative(n, k).collect();
        group.throughput(Throughput::Elements(masks.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("rank", format!("n{}_k{}", n, k)),
            &masks,
            |b, masks| {
                b.iter(|| {
                    let mut acc = 0u64;
                    for &mask in masks {
                        acc = acc.wrapping_add(table.cumulative_rank(black_box(mask), n));
                    }
                    black_box(acc)
                })
            },
        );
    }

    group.finish();
}

/// Benchmark shared-read intersection of two full-coverage columns
fn bench_intersection(c: &mut Criterion) {
    let make_column = |stride: u32| {
        let mut col = Column::new();
        for i in 0..32u32 {
            col.push(Entry::new(i * stride, Allele::Major, 30));
        }
        col
    };
    let a = make_column(2);
    let b = make_column(3);

    c.bench_function("intersection_32x32", |bench| {
        bench.iter(|| {
            let ix = Intersection::compute(black_box(&a), black_box(&b));
            black_box(ix.len())
        })
    });
}

criterion_group!(benches, bench_enumeration, bench_ranking, bench_intersection);
criterion_main!(benches);

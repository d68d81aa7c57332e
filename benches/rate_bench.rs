// Rate-math benchmarks for the vault accounting engine.
//
// Covers WAD multiplication, exponentiation by squaring over year-scale
// exponents, and the full per-second-rate to APR/APY conversions.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use coffer::config::{SECONDS_PER_YEAR, WAD};
use coffer::rate::{compound_apy_bps, simple_apr_bps, wad_mul, wad_pow};

fn bench_wad_mul(c: &mut Criterion) {
    let a = WAD + 1_000_000_000;
    let b_val = WAD + 2_500_000_000;

    c.bench_function("rate/wad_mul", |b| {
        b.iter(|| wad_mul(a, b_val).unwrap());
    });
}

fn bench_wad_pow(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate/wad_pow");
    let base = WAD + 1_000_000_000; // 1e-9/sec

    for exp in [3_600u64, 86_400, SECONDS_PER_YEAR] {
        group.bench_with_input(BenchmarkId::from_parameter(exp), &exp, |b, &exp| {
            b.iter(|| wad_pow(base, exp).unwrap());
        });
    }

    group.finish();
}

fn bench_apr_conversion(c: &mut Criterion) {
    let rate = 1_000_000_000u128;

    c.bench_function("rate/simple_apr_bps", |b| {
        b.iter(|| simple_apr_bps(rate).unwrap());
    });
}

fn bench_apy_conversion(c: &mut Criterion) {
    let rate = 1_000_000_000u128;

    c.bench_function("rate/compound_apy_bps", |b| {
        b.iter(|| compound_apy_bps(rate).unwrap());
    });
}

criterion_group!(
    benches,
    bench_wad_mul,
    bench_wad_pow,
    bench_apr_conversion,
    bench_apy_conversion,
);
criterion_main!(benches);

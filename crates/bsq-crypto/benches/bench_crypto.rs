// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BENCHMARK SUITE — bsq-crypto
//
// Measures hash throughput on the sizes the node actually hashes:
// OP_RETURN inputs (small) and serialized transactions (up to a few KB).
// Run: cargo bench -p bsq-crypto
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use bsq_crypto::{double_sha256, sha256_ripemd160, txid_hex};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_hash160(c: &mut Criterion) {
    let mut group = c.benchmark_group("crypto/sha256_ripemd160");
    for size in [32, 256, 1024, 4096] {
        let data = vec![0xAB; size];
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, d| {
            b.iter(|| black_box(sha256_ripemd160(d)))
        });
    }
    group.finish();
}

fn bench_double_sha256(c: &mut Criterion) {
    let mut group = c.benchmark_group("crypto/double_sha256");
    for size in [250, 1024, 4096] {
        let data = vec![0x5A; size];
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, d| {
            b.iter(|| black_box(double_sha256(d)))
        });
    }
    group.finish();
}

fn bench_txid_hex(c: &mut Criterion) {
    let raw_tx = vec![0x01; 250];
    c.bench_function("crypto/txid_hex", |b| b.iter(|| black_box(txid_hex(&raw_tx))));
}

criterion_group!(benches, bench_hash160, bench_double_sha256, bench_txid_hex);
criterion_main!(benches);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BENCHMARK SUITE — bsq-consensus
//
// Measures classification and block replay throughput.
// Run: cargo bench -p bsq-consensus
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bsq_consensus::{classify, BsqChain};
use bsq_core::{
    op_return, BsqStateStore, BsqUtxo, OutputRef, RawBlock, RawTx, RawTxOutput, Tx, TxOutputType,
    UtxoSet,
};

// ─────────────────────────────────────────────────────────────────
// SINGLE TX CLASSIFICATION
// ─────────────────────────────────────────────────────────────────

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify/outputs");

    for num_outputs in [1usize, 4, 16, 64] {
        let mut outputs: Vec<RawTxOutput> =
            (0..num_outputs).map(|_| RawTxOutput::spendable(100)).collect();
        outputs.push(RawTxOutput::op_return(op_return::encode(b"bench")));
        let raw = RawTx {
            id: "bench".to_string(),
            inputs: vec![OutputRef::new("funding", 0)],
            outputs,
        };

        group.bench_with_input(BenchmarkId::new("tx", num_outputs), &raw, |b, raw| {
            b.iter(|| {
                let mut state = UtxoSet::new();
                state
                    .insert(
                        OutputRef::new("funding", 0),
                        BsqUtxo {
                            value: 1_000_000,
                            height: 1,
                            output_type: TxOutputType::BsqOutput,
                        },
                    )
                    .unwrap();
                let mut tx = Tx::from_raw(raw, 2);
                black_box(classify(2, &mut tx, &mut state).unwrap())
            })
        });
    }
    group.finish();
}

// ─────────────────────────────────────────────────────────────────
// BLOCK REPLAY
// ─────────────────────────────────────────────────────────────────

fn replay_blocks(count: u64) -> Vec<RawBlock> {
    let mut blocks = vec![RawBlock {
        height: 1,
        hash: "b1".to_string(),
        previous_block_hash: "b0".to_string(),
        txs: vec![RawTx {
            id: "gen".to_string(),
            inputs: vec![],
            outputs: vec![RawTxOutput::spendable(u32::MAX as u64)],
        }],
    }];
    let mut prev = OutputRef::new("gen", 0);
    let mut remaining = u32::MAX as u64;
    for height in 2..=count {
        let id = format!("tx{}", height);
        remaining -= 10;
        blocks.push(RawBlock {
            height,
            hash: format!("b{}", height),
            previous_block_hash: format!("b{}", height - 1),
            txs: vec![RawTx {
                id: id.clone(),
                inputs: vec![prev],
                outputs: vec![RawTxOutput::spendable(remaining), RawTxOutput::spendable(9)],
            }],
        });
        prev = OutputRef::new(id, 0);
    }
    blocks
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain/replay");
    group.sample_size(20);

    for count in [10u64, 100, 1_000] {
        let blocks = replay_blocks(count);
        group.bench_with_input(BenchmarkId::new("blocks", count), &blocks, |b, blocks| {
            b.iter(|| {
                let mut chain = BsqChain::new("gen", 1, UtxoSet::new());
                for block in blocks {
                    chain.apply_raw_block(block).unwrap();
                }
                black_box(chain.state().state_root())
            })
        });
    }
    group.finish();
}

// ─────────────────────────────────────────────────────────────────

criterion_group!(benches, bench_classify, bench_replay);
criterion_main!(benches);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PROPERTY-BASED TESTS — bsq-consensus
//
// Verifies classification invariants for arbitrary funding and outputs:
// - Token value is conserved: inputs == assigned outputs + burnt fee
// - Burnt fee and final type follow the leftover balance
// - Zero-balance transactions never touch the ledger state
// - Independent nodes derive identical state from identical blocks
//
// Run: cargo test --release -p bsq-consensus --test prop_consensus
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use bsq_consensus::{classify, BsqChain};
use bsq_core::{
    BsqStateStore, BsqUtxo, OutputRef, RawBlock, RawTx, RawTxOutput, Tx, TxOutputType, TxType,
    UtxoSet,
};
use proptest::prelude::*;

fn funded(value: u64) -> UtxoSet {
    let mut state = UtxoSet::new();
    state
        .insert(
            OutputRef::new("funding", 0),
            BsqUtxo {
                value,
                height: 1,
                output_type: TxOutputType::BsqOutput,
            },
        )
        .unwrap();
    state
}

fn spending_tx(values: &[u64]) -> Tx {
    let raw = RawTx {
        id: "spend".to_string(),
        inputs: vec![OutputRef::new("funding", 0)],
        outputs: values.iter().map(|v| RawTxOutput::spendable(*v)).collect(),
    };
    Tx::from_raw(&raw, 2)
}

// ─────────────────────────────────────────────────────────────────
// CLASSIFIER PROPERTIES
// ─────────────────────────────────────────────────────────────────

proptest! {
    /// PROPERTY: input value == token assigned to outputs + burnt fee
    #[test]
    fn prop_value_conserved(
        funding in 1u64..=10_000_000,
        outputs in proptest::collection::vec(0u64..=5_000_000, 0..8),
    ) {
        let mut state = funded(funding);
        let mut tx = spending_tx(&outputs);

        prop_assert!(classify(2, &mut tx, &mut state).unwrap());
        prop_assert_eq!(tx.total_bsq_output() + tx.burnt_fee, funding);
        prop_assert_eq!(state.total_value(), tx.total_bsq_output() as u128);
    }

    /// PROPERTY: two outputs v1 + v2 <= V leave exactly V - v1 - v2 burnt;
    /// the transfer becomes a fee payment iff something was burnt
    #[test]
    fn prop_burnt_fee_two_outputs(
        v1 in 1u64..=1_000_000,
        v2 in 1u64..=1_000_000,
        extra in 0u64..=1_000_000,
    ) {
        let funding = v1 + v2 + extra;
        let mut state = funded(funding);
        let mut tx = spending_tx(&[v1, v2]);

        prop_assert!(classify(2, &mut tx, &mut state).unwrap());
        prop_assert_eq!(tx.burnt_fee, extra);
        if extra == 0 {
            prop_assert_eq!(tx.tx_type, TxType::TransferBsq);
        } else {
            prop_assert_eq!(tx.tx_type, TxType::PayTradeFee);
        }
    }

    /// PROPERTY: once an output is BTC, no later output carries token value
    #[test]
    fn prop_no_bsq_after_btc(
        funding in 1u64..=1_000_000,
        outputs in proptest::collection::vec(0u64..=2_000_000, 1..8),
    ) {
        let mut state = funded(funding);
        let mut tx = spending_tx(&outputs);
        classify(2, &mut tx, &mut state).unwrap();

        let first_btc = tx
            .outputs
            .iter()
            .position(|o| o.output_type == TxOutputType::BtcOutput);
        if let Some(first) = first_btc {
            prop_assert!(tx.outputs[first..].iter().all(|o| o.bsq_value == 0));
        }
    }

    /// PROPERTY: a tx spending only unknown outputs is not a token tx and
    /// leaves the state untouched
    #[test]
    fn prop_zero_balance_untouched(
        funding in 1u64..=1_000_000,
        index in 1u32..100,
        outputs in proptest::collection::vec(0u64..=1_000_000, 0..4),
    ) {
        let mut state = funded(funding);
        let before = state.clone();
        let raw = RawTx {
            id: "foreign".to_string(),
            inputs: vec![OutputRef::new("funding", index)],
            outputs: outputs.into_iter().map(RawTxOutput::spendable).collect(),
        };
        let mut tx = Tx::from_raw(&raw, 2);

        prop_assert!(!classify(2, &mut tx, &mut state).unwrap());
        prop_assert_eq!(tx.tx_type, TxType::Unverified);
        prop_assert_eq!(state, before);
    }
}

// ─────────────────────────────────────────────────────────────────
// CHAIN DETERMINISM
// ─────────────────────────────────────────────────────────────────

fn chain_of(splits: &[u64]) -> Vec<RawBlock> {
    let mut blocks = vec![RawBlock {
        height: 5,
        hash: "b5".to_string(),
        previous_block_hash: "b4".to_string(),
        txs: vec![RawTx {
            id: "gen".to_string(),
            inputs: vec![],
            outputs: vec![RawTxOutput::spendable(1_000_000)],
        }],
    }];
    let mut prev = OutputRef::new("gen", 0);
    for (i, split) in splits.iter().enumerate() {
        let height = 6 + i as u64;
        let id = format!("tx{}", i);
        blocks.push(RawBlock {
            height,
            hash: format!("b{}", height),
            previous_block_hash: format!("b{}", height - 1),
            txs: vec![RawTx {
                id: id.clone(),
                inputs: vec![prev],
                outputs: vec![RawTxOutput::spendable(*split), RawTxOutput::spendable(1)],
            }],
        });
        prev = OutputRef::new(id, 0);
    }
    blocks
}

proptest! {
    /// PROPERTY: two isolated nodes replaying the same blocks agree on the
    /// state root and the derived blocks
    #[test]
    fn prop_replay_deterministic(splits in proptest::collection::vec(1u64..=400_000, 0..6)) {
        let blocks = chain_of(&splits);
        let mut a = BsqChain::new("gen", 5, UtxoSet::new());
        let mut b = BsqChain::new("gen", 5, UtxoSet::new());
        for block in &blocks {
            a.apply_raw_block(block).unwrap();
            b.apply_raw_block(block).unwrap();
        }
        prop_assert_eq!(a.state().state_root(), b.state().state_root());
        prop_assert_eq!(a.blocks(), b.blocks());
    }

    /// PROPERTY: total supply only shrinks (by burnt fees), never grows
    #[test]
    fn prop_supply_never_grows(splits in proptest::collection::vec(1u64..=400_000, 0..6)) {
        let mut chain = BsqChain::new("gen", 5, UtxoSet::new());
        for block in &chain_of(&splits) {
            chain.apply_raw_block(block).unwrap();
        }
        let burnt = chain.stats().total_burnt_fee as u128;
        prop_assert_eq!(chain.state().total_value() + burnt, 1_000_000u128);
    }
}

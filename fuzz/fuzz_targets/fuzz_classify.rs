//! Fuzz target: transaction classification
//!
//! Random funding + random outputs (with optional OP_RETURN data).
//! Verifies classify never panics and conserves token value:
//! input balance == assigned outputs + burnt fee.
//!
//! Run: cargo +nightly fuzz run fuzz_classify

#![no_main]
use arbitrary::Arbitrary;
use bsq_consensus::classify;
use bsq_core::{
    BsqStateStore, BsqUtxo, OutputRef, RawTx, RawTxOutput, Tx, TxOutputType, UtxoSet,
};
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeSet;

#[derive(Arbitrary, Debug)]
struct FuzzClassifyInput {
    funding: Vec<u32>,
    spend: Vec<u8>,
    outputs: Vec<(u32, Option<Vec<u8>>)>,
}

fuzz_target!(|input: FuzzClassifyInput| {
    let mut state = UtxoSet::new();
    // Cap vector sizes (prevent OOM / slow units)
    for (i, value) in input.funding.iter().take(8).enumerate() {
        if *value > 0 {
            state
                .insert(
                    OutputRef::new("funding", i as u32),
                    BsqUtxo {
                        value: *value as u64,
                        height: 1,
                        output_type: TxOutputType::BsqOutput,
                    },
                )
                .unwrap();
        }
    }
    let before = state.total_value();

    let raw = RawTx {
        id: "fuzz".to_string(),
        inputs: input
            .spend
            .iter()
            .take(16)
            .map(|i| (*i % 10) as u32)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|i| OutputRef::new("funding", i))
            .collect(),
        outputs: input
            .outputs
            .into_iter()
            .take(16)
            .map(|(value, data)| match data {
                Some(data) => RawTxOutput::op_return(data),
                None => RawTxOutput::spendable(value as u64),
            })
            .collect(),
    };
    let mut tx = Tx::from_raw(&raw, 2);

    let is_bsq = classify(2, &mut tx, &mut state).expect("u32 funding cannot overflow");
    let spent: u64 = tx.inputs.iter().filter_map(|i| i.bsq_value).sum();
    if is_bsq {
        assert_eq!(spent, tx.total_bsq_output() + tx.burnt_fee);
        assert_eq!(state.total_value() + tx.burnt_fee as u128, before);
    } else {
        assert_eq!(state.total_value(), before);
        assert_eq!(tx.burnt_fee, 0);
    }
});

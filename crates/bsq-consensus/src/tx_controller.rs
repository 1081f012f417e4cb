// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - TRANSACTION CLASSIFIER
//
// Every node must reproduce these four steps exactly:
// 1. Input balance = sum of token value of spent outputs (spent ones removed)
// 2. If positive: record recognized inputs, then evaluate outputs in order
// 3. Leftover balance is burnt; a plain transfer becomes a fee payment
// 4. Return whether the input balance was positive
//
// The genesis transaction never reaches this function; the block driver
// seeds it directly.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use bsq_core::{BsqStateStore, Tx, TxType};

use crate::error::ConsensusError;
use crate::tx_inputs::{apply_state_change, evaluate_inputs};
use crate::tx_outputs::OutputEvaluator;

/// Classify `tx` against `state`. Returns `true` iff the transaction carries
/// token value.
///
/// Errors abort the enclosing block; callers run this against a staged
/// overlay so an error never leaves `state` partially mutated.
pub fn classify<S: BsqStateStore>(
    block_height: u64,
    tx: &mut Tx,
    state: &mut S,
) -> Result<bool, ConsensusError> {
    let inputs = evaluate_inputs(tx, state)?;
    let mut balance = inputs.balance;
    let is_bsq_tx = balance.is_positive();

    if is_bsq_tx {
        apply_state_change(tx, &inputs);
        OutputEvaluator::new().evaluate(block_height, tx, &mut balance, state)?;

        if balance.is_positive() {
            // positive i64, lossless
            tx.burnt_fee = balance.value() as u64;
            if tx.tx_type == TxType::TransferBsq {
                tx.tx_type = TxType::PayTradeFee;
            }
            log::debug!(
                "tx {} burnt {} ({})",
                tx.id,
                bsq_core::format_bsq(tx.burnt_fee),
                tx.tx_type
            );
        }
    }

    Ok(is_bsq_tx)
}

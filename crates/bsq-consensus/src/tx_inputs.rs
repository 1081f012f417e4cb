// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - INPUT EVALUATOR
//
// Sums the token value of the outputs a transaction spends and marks them
// spent in the ledger state. This is the only place prior state is consumed.
//
// 1. Read pass: look up every distinct spent reference, checked sum.
//    Unknown references contribute zero. A reference listed twice counts once.
// 2. Spend pass: only after the sum is known to fit, remove the entries.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::BTreeSet;

use bsq_core::{BsqStateStore, OutputRef, Tx, TxType};

use crate::balance::BsqInputBalance;
use crate::error::ConsensusError;

/// Result of evaluating a transaction's inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputEvaluation {
    pub balance: BsqInputBalance,
    /// (input index, token value) for each recognized token input
    pub recognized: Vec<(usize, u64)>,
}

pub fn evaluate_inputs<S: BsqStateStore>(
    tx: &Tx,
    state: &mut S,
) -> Result<InputEvaluation, ConsensusError> {
    let mut seen: BTreeSet<&OutputRef> = BTreeSet::new();
    let mut recognized = Vec::new();
    let mut total: u64 = 0;

    for (i, input) in tx.inputs.iter().enumerate() {
        if !seen.insert(&input.output_ref) {
            continue;
        }
        if let Some(utxo) = state.get(&input.output_ref)? {
            total = total
                .checked_add(utxo.value)
                .ok_or_else(|| ConsensusError::BalanceOverflow {
                    tx_id: tx.id.clone(),
                })?;
            recognized.push((i, utxo.value));
        }
    }

    let value = i64::try_from(total).map_err(|_| ConsensusError::BalanceOverflow {
        tx_id: tx.id.clone(),
    })?;

    for (i, _) in &recognized {
        state.remove(&tx.inputs[*i].output_ref)?;
    }

    Ok(InputEvaluation {
        balance: BsqInputBalance::new(value),
        recognized,
    })
}

/// Record recognized input values on the transaction and enter the
/// transfer state.
pub fn apply_state_change(tx: &mut Tx, evaluation: &InputEvaluation) {
    for (i, value) in &evaluation.recognized {
        tx.inputs[*i].bsq_value = Some(*value);
    }
    if tx.tx_type == TxType::Unverified {
        tx.tx_type = TxType::TransferBsq;
    }
}

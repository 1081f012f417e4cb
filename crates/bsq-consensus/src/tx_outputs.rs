// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - OUTPUT EVALUATOR
//
// Walks outputs in strict transaction order and assigns token value:
//
//   OP_RETURN        → 0 BSQ; a recognized governance payload in the LAST
//                      output reclassifies the tx, anywhere else invalidates it
//   0 < value <= bal → BSQ output, inserted into the ledger state
//   anything else    → BTC output; every later output is BTC as well
//
// Change/fee outputs come last by convention. Whatever balance is left after
// this pass is burnt by the controller.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use bsq_core::op_return::{self, GovernanceKind};
use bsq_core::{BsqStateStore, BsqUtxo, Tx, TxOutputType, TxType};

use crate::balance::BsqInputBalance;
use crate::error::ConsensusError;

/// Per-transaction output evaluation state.
#[derive(Debug, Default)]
pub struct OutputEvaluator {
    btc_output_seen: bool,
}

impl OutputEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate every output of `tx` in order.
    pub fn evaluate<S: BsqStateStore>(
        &mut self,
        block_height: u64,
        tx: &mut Tx,
        balance: &mut BsqInputBalance,
        state: &mut S,
    ) -> Result<(), ConsensusError> {
        for i in 0..tx.outputs.len() {
            self.evaluate_output(block_height, tx, i, balance, state)?;
        }
        Ok(())
    }

    fn evaluate_output<S: BsqStateStore>(
        &mut self,
        block_height: u64,
        tx: &mut Tx,
        i: usize,
        balance: &mut BsqInputBalance,
        state: &mut S,
    ) -> Result<(), ConsensusError> {
        let is_last = i + 1 == tx.outputs.len();

        if let Some(data) = &tx.outputs[i].op_return_data {
            let kind = op_return::decode(data).and_then(|p| p.kind());
            tx.outputs[i].bsq_value = 0;
            tx.outputs[i].output_type = TxOutputType::OpReturnOutput;
            match kind {
                Some(kind) if is_last => Self::apply_governance(tx, i, kind),
                Some(kind) => {
                    log::warn!(
                        "tx {}: {:?} OP_RETURN at output {} is not the last output, tx invalid",
                        tx.id,
                        kind,
                        i
                    );
                    tx.tx_type = TxType::Invalid;
                }
                None => {}
            }
            return Ok(());
        }

        let value = tx.outputs[i].value;
        let fits = value > 0 && i128::from(value) <= i128::from(balance.value());
        if !self.btc_output_seen && fits {
            // value <= balance <= i64::MAX
            balance.subtract(value as i64);
            let output = &mut tx.outputs[i];
            output.bsq_value = value;
            output.output_type = TxOutputType::BsqOutput;
            state.insert(
                tx.output_ref(i as u32),
                BsqUtxo {
                    value,
                    height: block_height,
                    output_type: TxOutputType::BsqOutput,
                },
            )?;
        } else {
            self.btc_output_seen = true;
            tx.outputs[i].output_type = TxOutputType::BtcOutput;
        }
        Ok(())
    }

    fn apply_governance(tx: &mut Tx, i: usize, kind: GovernanceKind) {
        if tx.tx_type == TxType::Invalid {
            return;
        }
        match kind {
            GovernanceKind::CompensationRequest => {
                tx.tx_type = TxType::CompensationRequest;
                tx.outputs[i].output_type = TxOutputType::CompensationRequestOpReturnOutput;
                if i > 0 && tx.outputs[i - 1].output_type == TxOutputType::BtcOutput {
                    tx.outputs[i - 1].output_type = TxOutputType::IssuanceCandidateOutput;
                }
            }
            GovernanceKind::Vote => {
                tx.tx_type = TxType::Vote;
                tx.outputs[i].output_type = TxOutputType::VoteOpReturnOutput;
            }
        }
        log::debug!("tx {} reclassified as {}", tx.id, tx.tx_type);
    }
}

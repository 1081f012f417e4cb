// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - BLOCK-PROCESSING DRIVER
//
// Applies raw chain blocks to the derived ledger strictly in order:
// 1. Ignore blocks below the genesis height
// 2. Check the block extends the head (height + previous hash)
// 3. Seed the genesis tx directly, classify every other tx in block order
//    against a staged overlay
// 4. Commit staged writes and append the block only if all of it succeeded
//
// Peer blocks are never trusted: they are re-derived from their raw form and
// rejected on any difference.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use bsq_core::dao_config::DaoConfig;
use bsq_core::{
    validate_tx_id, BsqBlock, BsqStateStore, BsqUtxo, RawBlock, Tx, TxOutputType, TxType,
};

use crate::error::ConsensusError;
use crate::staged::{StagedState, StagedWrites};
use crate::tx_controller::classify;

/// Derived ledger: a state store plus the blocks derived into it.
pub struct BsqChain<S: BsqStateStore> {
    genesis_tx_id: String,
    genesis_block_height: u64,
    state: S,
    blocks: Vec<BsqBlock>,
}

/// Chain statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStats {
    pub genesis_block_height: u64,
    pub head_height: Option<u64>,
    pub block_count: usize,
    pub bsq_tx_count: usize,
    pub total_burnt_fee: u64,
}

impl<S: BsqStateStore> BsqChain<S> {
    pub fn new(genesis_tx_id: impl Into<String>, genesis_block_height: u64, state: S) -> Self {
        Self {
            genesis_tx_id: genesis_tx_id.into(),
            genesis_block_height,
            state,
            blocks: Vec::new(),
        }
    }

    pub fn from_config(config: &DaoConfig, state: S) -> Self {
        Self::new(
            config.genesis_tx_id.clone(),
            config.genesis_block_height,
            state,
        )
    }

    /// Resume on top of blocks that were already applied to `state`
    /// (e.g. loaded back from a block store).
    pub fn with_blocks(mut self, blocks: Vec<BsqBlock>) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    pub fn blocks(&self) -> &[BsqBlock] {
        &self.blocks
    }

    /// Blocks at or above `height`, ascending.
    pub fn blocks_from(&self, height: u64) -> &[BsqBlock] {
        let start = self.blocks.partition_point(|b| b.height < height);
        &self.blocks[start..]
    }

    pub fn head(&self) -> Option<&BsqBlock> {
        self.blocks.last()
    }

    pub fn head_height(&self) -> Option<u64> {
        self.head().map(|b| b.height)
    }

    pub fn genesis_block_height(&self) -> u64 {
        self.genesis_block_height
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            genesis_block_height: self.genesis_block_height,
            head_height: self.head_height(),
            block_count: self.blocks.len(),
            bsq_tx_count: self.blocks.iter().map(|b| b.txs.len()).sum(),
            total_burnt_fee: self.blocks.iter().map(BsqBlock::total_burnt_fee).sum(),
        }
    }

    /// Apply one raw chain block. Returns the derived block, or `None` for a
    /// block below the genesis height.
    pub fn apply_raw_block(&mut self, raw: &RawBlock) -> Result<Option<&BsqBlock>, ConsensusError> {
        let (block, writes) = match self.stage_block(raw)? {
            Some(staged) => staged,
            None => return Ok(None),
        };
        self.commit(block, writes)
    }

    /// Re-derive a block received from a peer and append it only if the
    /// local derivation matches it exactly.
    ///
    /// The peer block is re-derived from its own transactions, so this only
    /// catches a block that contradicts itself (wrong types, fees, values).
    /// A peer that leaves out a token-bearing transaction is not detected;
    /// use `apply_peer_block_with_raw` when the chain block is available.
    pub fn apply_peer_block(&mut self, peer: &BsqBlock) -> Result<Option<&BsqBlock>, ConsensusError> {
        self.apply_checked(&peer.to_raw(), peer)
    }

    /// Derive `raw` (the full chain block at the peer block's height) and
    /// append it only if the peer block matches that derivation exactly.
    /// Catches omitted or injected transactions as well as forged values.
    pub fn apply_peer_block_with_raw(
        &mut self,
        peer: &BsqBlock,
        raw: &RawBlock,
    ) -> Result<Option<&BsqBlock>, ConsensusError> {
        if raw.height != peer.height {
            return Err(ConsensusError::Divergence {
                height: peer.height,
                reason: format!("chain block at height {}", raw.height),
            });
        }
        self.apply_checked(raw, peer)
    }

    fn apply_checked(&mut self, raw: &RawBlock, peer: &BsqBlock) -> Result<Option<&BsqBlock>, ConsensusError> {
        let (block, writes) = match self.stage_block(raw)? {
            Some(staged) => staged,
            None => return Ok(None),
        };
        if let Some(reason) = divergence(&block, peer) {
            log::warn!("Rejecting peer block {}: {}", peer.height, reason);
            return Err(ConsensusError::Divergence {
                height: peer.height,
                reason,
            });
        }
        self.commit(block, writes)
    }

    fn commit(&mut self, block: BsqBlock, writes: StagedWrites) -> Result<Option<&BsqBlock>, ConsensusError> {
        let write_count = writes.len();
        self.state.commit_block(writes, &block)?;
        log::info!(
            "Applied block {} ({} BSQ txs, {} state writes)",
            block.height,
            block.txs.len(),
            write_count
        );
        self.blocks.push(block);
        Ok(self.blocks.last())
    }

    fn check_continuity(&self, raw: &RawBlock) -> Result<(), ConsensusError> {
        let expected = match self.head() {
            Some(head) => head.height + 1,
            None => self.genesis_block_height,
        };
        if raw.height != expected {
            return Err(ConsensusError::HeightMismatch {
                expected,
                found: raw.height,
            });
        }
        if let Some(head) = self.head() {
            if raw.previous_block_hash != head.hash {
                return Err(ConsensusError::PreviousHashMismatch {
                    height: raw.height,
                    expected: head.hash.clone(),
                    found: raw.previous_block_hash.clone(),
                });
            }
        }

        let mut ids = HashSet::new();
        for tx in &raw.txs {
            if validate_tx_id(&tx.id).is_err() {
                return Err(ConsensusError::MalformedTxId {
                    height: raw.height,
                    tx_id: tx.id.clone(),
                });
            }
            if !ids.insert(tx.id.as_str()) {
                return Err(ConsensusError::DuplicateTx {
                    height: raw.height,
                    tx_id: tx.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Derive `raw` against a staged overlay. The base state is untouched.
    fn stage_block(&mut self, raw: &RawBlock) -> Result<Option<(BsqBlock, StagedWrites)>, ConsensusError> {
        if raw.height < self.genesis_block_height {
            log::debug!("Skipping block {} below genesis height", raw.height);
            return Ok(None);
        }
        self.check_continuity(raw)?;

        let is_genesis_block = raw.height == self.genesis_block_height;
        let mut staged = StagedState::new(&mut self.state);
        let mut txs = Vec::new();

        for raw_tx in &raw.txs {
            let mut tx = Tx::from_raw(raw_tx, raw.height);
            if is_genesis_block && raw_tx.id == self.genesis_tx_id {
                seed_genesis(&mut tx, &mut staged)?;
                txs.push(tx);
            } else if classify(raw.height, &mut tx, &mut staged)? {
                txs.push(tx);
            }
        }

        let block = BsqBlock {
            height: raw.height,
            hash: raw.hash.clone(),
            previous_block_hash: raw.previous_block_hash.clone(),
            txs,
        };
        Ok(Some((block, staged.into_writes())))
    }
}

/// Every spendable output of the genesis tx becomes a token output.
fn seed_genesis<S: BsqStateStore>(tx: &mut Tx, state: &mut S) -> Result<(), ConsensusError> {
    tx.tx_type = TxType::Genesis;
    let mut issued: u64 = 0;
    for i in 0..tx.outputs.len() {
        let output = &mut tx.outputs[i];
        if output.is_op_return() {
            output.output_type = TxOutputType::OpReturnOutput;
            continue;
        }
        if output.value == 0 {
            output.output_type = TxOutputType::BtcOutput;
            continue;
        }
        output.bsq_value = output.value;
        output.output_type = TxOutputType::BsqOutput;
        issued = issued.saturating_add(output.value);
        let utxo = BsqUtxo {
            value: output.value,
            height: tx.block_height,
            output_type: TxOutputType::BsqOutput,
        };
        state.insert(tx.output_ref(i as u32), utxo)?;
    }
    log::info!(
        "Genesis tx {} issued {}",
        tx.id,
        bsq_core::format_bsq(issued)
    );
    Ok(())
}

fn divergence(local: &BsqBlock, peer: &BsqBlock) -> Option<String> {
    if local == peer {
        return None;
    }
    if local.hash != peer.hash {
        return Some(format!("hash {} != {}", peer.hash, local.hash));
    }
    if local.txs.len() != peer.txs.len() {
        return Some(format!(
            "{} BSQ txs, derived {}",
            peer.txs.len(),
            local.txs.len()
        ));
    }
    for (l, p) in local.txs.iter().zip(&peer.txs) {
        if l != p {
            return Some(format!(
                "tx {}: type {} burnt {}, derived type {} burnt {}",
                p.id, p.tx_type, p.burnt_fee, l.tx_type, l.burnt_fee
            ));
        }
    }
    Some("header mismatch".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsq_core::{OutputRef, RawTx, RawTxOutput, UtxoSet};

    const GENESIS_ID: &str = "gen";
    const GENESIS_HEIGHT: u64 = 10;

    fn genesis_block() -> RawBlock {
        RawBlock {
            height: GENESIS_HEIGHT,
            hash: "h10".to_string(),
            previous_block_hash: "h9".to_string(),
            txs: vec![RawTx {
                id: GENESIS_ID.to_string(),
                inputs: vec![OutputRef::new("coinbase", 0)],
                outputs: vec![RawTxOutput::spendable(2_500), RawTxOutput::spendable(7_500)],
            }],
        }
    }

    fn transfer_block() -> RawBlock {
        RawBlock {
            height: GENESIS_HEIGHT + 1,
            hash: "h11".to_string(),
            previous_block_hash: "h10".to_string(),
            txs: vec![
                RawTx {
                    id: "btc".to_string(),
                    inputs: vec![OutputRef::new("other", 0)],
                    outputs: vec![RawTxOutput::spendable(1)],
                },
                RawTx {
                    id: "t1".to_string(),
                    inputs: vec![OutputRef::new(GENESIS_ID, 0)],
                    outputs: vec![RawTxOutput::spendable(2_000), RawTxOutput::spendable(90_000)],
                },
            ],
        }
    }

    fn chain() -> BsqChain<UtxoSet> {
        BsqChain::new(GENESIS_ID, GENESIS_HEIGHT, UtxoSet::new())
    }

    #[test]
    fn test_genesis_seeding() {
        let mut chain = chain();
        let block = chain.apply_raw_block(&genesis_block()).unwrap().unwrap();
        assert_eq!(block.txs.len(), 1);
        assert_eq!(block.txs[0].tx_type, TxType::Genesis);
        assert_eq!(chain.state().total_value(), 10_000);
        assert_eq!(chain.head_height(), Some(GENESIS_HEIGHT));
    }

    #[test]
    fn test_blocks_below_genesis_ignored() {
        let mut chain = chain();
        let mut early = genesis_block();
        early.height = 3;
        assert!(chain.apply_raw_block(&early).unwrap().is_none());
        assert!(chain.blocks().is_empty());
    }

    #[test]
    fn test_transfer_keeps_only_token_txs() {
        let mut chain = chain();
        chain.apply_raw_block(&genesis_block()).unwrap();
        let block = chain.apply_raw_block(&transfer_block()).unwrap().unwrap();

        assert_eq!(block.txs.len(), 1);
        assert_eq!(block.txs[0].id, "t1");
        assert_eq!(block.txs[0].burnt_fee, 500);
        assert_eq!(block.txs[0].tx_type, TxType::PayTradeFee);
        assert_eq!(chain.state().total_value(), 9_500);
        assert_eq!(chain.stats().total_burnt_fee, 500);
    }

    #[test]
    fn test_continuity_errors_leave_chain_untouched() {
        let mut chain = chain();
        chain.apply_raw_block(&genesis_block()).unwrap();
        let root = chain.state().state_root();

        let mut gap = transfer_block();
        gap.height = GENESIS_HEIGHT + 2;
        assert!(matches!(
            chain.apply_raw_block(&gap),
            Err(ConsensusError::HeightMismatch { expected: 11, found: 12 })
        ));

        let mut fork = transfer_block();
        fork.previous_block_hash = "elsewhere".to_string();
        assert!(matches!(
            chain.apply_raw_block(&fork),
            Err(ConsensusError::PreviousHashMismatch { .. })
        ));

        assert_eq!(chain.state().state_root(), root);
        assert_eq!(chain.head_height(), Some(GENESIS_HEIGHT));
    }

    #[test]
    fn test_duplicate_tx_rejected() {
        let mut chain = chain();
        chain.apply_raw_block(&genesis_block()).unwrap();

        let mut block = transfer_block();
        block.txs.push(block.txs[1].clone());
        assert!(matches!(
            chain.apply_raw_block(&block),
            Err(ConsensusError::DuplicateTx { .. })
        ));
        assert!(chain.state().contains(&OutputRef::new(GENESIS_ID, 0)));
    }

    #[test]
    fn test_abort_mid_block_discards_earlier_txs() {
        let mut genesis = genesis_block();
        genesis.txs[0].outputs[1] = RawTxOutput::spendable(i64::MAX as u64 + 1);
        let mut chain = chain();
        chain.apply_raw_block(&genesis).unwrap();
        let root = chain.state().state_root();

        // t1 is valid and staged; t2's input sum does not fit the balance
        let mut block = transfer_block();
        block.txs.push(RawTx {
            id: "t2".to_string(),
            inputs: vec![OutputRef::new(GENESIS_ID, 1)],
            outputs: vec![RawTxOutput::spendable(1)],
        });
        assert!(matches!(
            chain.apply_raw_block(&block),
            Err(ConsensusError::BalanceOverflow { .. })
        ));
        assert_eq!(chain.state().state_root(), root);
        assert!(chain.state().contains(&OutputRef::new(GENESIS_ID, 0)));
        assert_eq!(chain.head_height(), Some(GENESIS_HEIGHT));
    }

    #[test]
    fn test_peer_block_rederived() {
        let mut source = chain();
        source.apply_raw_block(&genesis_block()).unwrap();
        source.apply_raw_block(&transfer_block()).unwrap();

        let mut follower = chain();
        for block in source.blocks().to_vec() {
            follower.apply_peer_block(&block).unwrap();
        }
        assert_eq!(follower.state().state_root(), source.state().state_root());
        assert_eq!(follower.blocks(), source.blocks());
    }

    #[test]
    fn test_tampered_peer_block_rejected() {
        let mut source = chain();
        source.apply_raw_block(&genesis_block()).unwrap();
        source.apply_raw_block(&transfer_block()).unwrap();

        let mut follower = chain();
        follower.apply_peer_block(&source.blocks()[0]).unwrap();
        let root = follower.state().state_root();

        let mut forged = source.blocks()[1].clone();
        forged.txs[0].burnt_fee = 0;
        assert!(matches!(
            follower.apply_peer_block(&forged),
            Err(ConsensusError::Divergence { height: 11, .. })
        ));
        assert_eq!(follower.state().state_root(), root);
        assert_eq!(follower.head_height(), Some(GENESIS_HEIGHT));
    }

    #[test]
    fn test_tx_id_with_separator_aborts_block() {
        let mut chain = chain();
        chain.apply_raw_block(&genesis_block()).unwrap();
        let root = chain.state().state_root();

        let mut block = transfer_block();
        block.txs[1].id = "t1:evil".to_string();
        assert!(matches!(
            chain.apply_raw_block(&block),
            Err(ConsensusError::MalformedTxId { height: 11, .. })
        ));
        assert_eq!(chain.state().state_root(), root);
        assert!(chain.state().iter().all(|(r, _)| !r.tx_id.contains(':')));
    }

    #[test]
    fn test_peer_omitting_token_tx_caught_with_raw() {
        let mut source = chain();
        source.apply_raw_block(&genesis_block()).unwrap();
        source.apply_raw_block(&transfer_block()).unwrap();

        // Peer drops t1 from block 11: self-consistent, so only the chain
        // block reveals it
        let mut thin = source.blocks()[1].clone();
        thin.txs.clear();

        let mut follower = chain();
        follower
            .apply_peer_block_with_raw(&source.blocks()[0], &genesis_block())
            .unwrap();
        assert!(matches!(
            follower.apply_peer_block_with_raw(&thin, &transfer_block()),
            Err(ConsensusError::Divergence { height: 11, .. })
        ));
        assert_eq!(follower.head_height(), Some(GENESIS_HEIGHT));

        let mut unchecked = chain();
        unchecked.apply_peer_block(&source.blocks()[0]).unwrap();
        assert!(unchecked.apply_peer_block(&thin).is_ok());

        follower
            .apply_peer_block_with_raw(&source.blocks()[1], &transfer_block())
            .unwrap();
        assert_eq!(follower.state().state_root(), source.state().state_root());
    }

    #[test]
    fn test_blocks_from() {
        let mut chain = chain();
        chain.apply_raw_block(&genesis_block()).unwrap();
        chain.apply_raw_block(&transfer_block()).unwrap();
        assert_eq!(chain.blocks_from(0).len(), 2);
        assert_eq!(chain.blocks_from(11).len(), 1);
        assert!(chain.blocks_from(12).is_empty());
    }
}

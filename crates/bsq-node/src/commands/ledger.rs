use colored::*;
use std::path::Path;

use bsq_consensus::{BlockStore, BsqChain, SledStateStore};
use bsq_core::dao_config::DaoConfig;
use bsq_core::{format_bsq, RawBlock};

use crate::{print_info, print_success};

/// Persistent chain: sled UTXO state plus the derived blocks already in it.
/// Every applied block is committed together with its state changes, so
/// the chain and `blocks` always agree on the head.
pub struct NodeLedger {
    pub chain: BsqChain<SledStateStore>,
    pub blocks: BlockStore,
}

pub fn open(config: &DaoConfig) -> Result<NodeLedger, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.data_dir)?;
    let state = SledStateStore::open(config.ledger_db_path())?;
    let blocks = state.block_store();
    let chain = BsqChain::from_config(config, state).with_blocks(blocks.get_blocks_from(0)?);
    log::info!(
        "Ledger opened at {} (head {:?})",
        config.data_dir.display(),
        chain.head_height()
    );
    Ok(NodeLedger { chain, blocks })
}

pub fn replay(config: &DaoConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let raw_blocks = RawBlock::load_json_list(&std::fs::read_to_string(path)?)?;
    let mut ledger = open(config)?;
    print_info(&format!("Replaying {} raw blocks...", raw_blocks.len()));

    let mut applied = 0usize;
    for raw in &raw_blocks {
        if ledger.chain.head_height().is_some_and(|head| raw.height <= head) {
            continue;
        }
        if ledger.chain.apply_raw_block(raw)?.is_some() {
            applied += 1;
        }
    }

    let stats = ledger.chain.stats();
    print_success(&format!("Applied {} blocks", applied));
    println!(
        "{} {}",
        "Head:".bold(),
        stats
            .head_height
            .map(|h| h.to_string())
            .unwrap_or_else(|| "none".to_string())
            .cyan()
    );
    println!("{} {}", "BSQ txs:".bold(), stats.bsq_tx_count);
    println!("{} {}", "Burnt:".bold(), format_bsq(stats.total_burnt_fee));
    Ok(())
}

pub fn list_utxos(config: &DaoConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = open(config)?;
    let snapshot = ledger.chain.state().snapshot()?;

    for (output_ref, utxo) in snapshot.iter() {
        println!(
            "{}  {}  (height {})",
            output_ref.to_string().cyan(),
            format_bsq(utxo.value).green(),
            utxo.height
        );
    }
    println!();
    println!("{} {}", "UTXOs:".bold(), snapshot.len());
    println!(
        "{} {}",
        "Total:".bold(),
        format_bsq(u64::try_from(snapshot.total_value()).unwrap_or(u64::MAX))
    );
    println!("{} {}", "State root:".bold(), snapshot.state_root());
    Ok(())
}

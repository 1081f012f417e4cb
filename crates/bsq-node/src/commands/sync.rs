use colored::*;
use std::path::Path;

use bsq_core::dao_config::DaoConfig;
use bsq_network::sync::decode_response;
use bsq_network::{serve_request, GetBsqBlocksRequest, NetworkEnvelope, RequestTracker};

use super::ledger;
use crate::{print_error, print_success};

/// Answer a block request from the local block store.
pub fn serve(config: &DaoConfig, from: u64, nonce: i32) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = ledger::open(config)?;
    let request = GetBsqBlocksRequest {
        from_block_height: from,
        nonce,
    };
    let blocks = ledger.blocks.get_blocks_from(from)?;
    let response = serve_request(&request, &blocks);
    eprintln!(
        "{} serving {} blocks from {}",
        "ℹ".blue().bold(),
        response.bsq_blocks.len(),
        from
    );
    println!("{}", hex::encode(NetworkEnvelope::new(response).to_bytes()?));
    Ok(())
}

/// Decode a peer response, correlate it with our request, and apply every
/// block only after re-deriving it locally.
pub fn sync(
    config: &DaoConfig,
    response_file: &Path,
    nonce: i32,
    from: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = ledger::open(config)?;
    let from_block_height = from.unwrap_or_else(|| {
        ledger
            .chain
            .head_height()
            .map_or(config.genesis_block_height, |h| h + 1)
    });

    let mut tracker = RequestTracker::new();
    tracker.track(&GetBsqBlocksRequest {
        from_block_height,
        nonce,
    });

    let bytes = hex::decode(std::fs::read_to_string(response_file)?.trim())?;
    let response = tracker.accept_response(decode_response(&bytes)?)?;

    let mut applied = 0usize;
    for block in &response.bsq_blocks {
        if ledger.chain.head_height().is_some_and(|head| block.height <= head) {
            continue;
        }
        match ledger.chain.apply_peer_block(block) {
            Ok(Some(_)) => applied += 1,
            Ok(None) => {}
            Err(e) => {
                print_error(&format!("Block {} rejected: {}", block.height, e));
                return Err(e.into());
            }
        }
    }

    print_success(&format!(
        "Applied {} of {} peer blocks (nonce {})",
        applied,
        response.bsq_blocks.len(),
        response.request_nonce
    ));
    Ok(())
}

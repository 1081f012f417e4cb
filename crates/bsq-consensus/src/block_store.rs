// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - DERIVED BLOCK STORE (sled)
//
// Read view over the blocks and meta trees of the persistent ledger.
// Serves stored blocks to syncing peers and lets a restarted node resume
// from its head instead of replaying from genesis.
//
// Blocks are only ever written by `SledStateStore::commit_block`, in the
// same transaction as the UTXO changes they caused.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};

use bsq_core::{BsqBlock, StoreError};

use crate::sled_store::backend;

pub(crate) const HEAD_KEY: &[u8] = b"chain_head_height";

pub(crate) fn decode_head(bytes: &[u8]) -> Result<u64, StoreError> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| {
        StoreError::Corrupt(format!(
            "chain head height is {} bytes, expected 8",
            bytes.len()
        ))
    })?;
    Ok(u64::from_le_bytes(arr))
}

fn decode_block(bytes: &[u8]) -> Result<BsqBlock, StoreError> {
    BsqBlock::from_bytes(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[derive(Clone)]
pub struct BlockStore {
    blocks: sled::Tree,
    meta: sled::Tree,
}

/// Block store statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockStoreStats {
    pub block_count: usize,
    pub head_height: Option<u64>,
}

impl BlockStore {
    pub(crate) fn new(blocks: sled::Tree, meta: sled::Tree) -> Self {
        Self { blocks, meta }
    }

    pub fn head_height(&self) -> Result<Option<u64>, StoreError> {
        match self.meta.get(HEAD_KEY).map_err(backend)? {
            Some(bytes) => Ok(Some(decode_head(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_block(&self, height: u64) -> Result<Option<BsqBlock>, StoreError> {
        match self.blocks.get(height.to_be_bytes()).map_err(backend)? {
            Some(bytes) => Ok(Some(decode_block(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All stored blocks at or above `height`, ascending.
    pub fn get_blocks_from(&self, height: u64) -> Result<Vec<BsqBlock>, StoreError> {
        let mut blocks = Vec::new();
        for item in self.blocks.range(height.to_be_bytes()..) {
            let (_, value) = item.map_err(backend)?;
            blocks.push(decode_block(&value)?);
        }
        Ok(blocks)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn get_statistics(&self) -> Result<BlockStoreStats, StoreError> {
        Ok(BlockStoreStats {
            block_count: self.block_count(),
            head_height: self.head_height()?,
        })
    }
}

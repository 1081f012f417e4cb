// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - PERSISTENT LEDGER (sled)
//
// One sled database, three trees:
//   utxos  : "<tx_id>:<index>" (UTF-8) → versioned BsqUtxo record
//   blocks : height (u64 BE, so key order == height order) → versioned BsqBlock
//   meta   : "chain_head_height" → u64 LE
//
// `commit_block` writes a block's UTXO changes, the block and the new head in
// one cross-tree transaction. A crash leaves either all of it or none of it,
// so the UTXO state can never run ahead of the stored head.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::path::Path;

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Transactional, Tree};

use bsq_core::wire::{self, RECORD_VERSION};
use bsq_core::{BsqBlock, BsqStateStore, BsqUtxo, OutputRef, StoreError, UtxoSet};

use crate::block_store::{decode_head, BlockStore, HEAD_KEY};

const TREE_UTXOS: &str = "utxos";
const TREE_BLOCKS: &str = "blocks";
const TREE_META: &str = "meta";

pub struct SledStateStore {
    db: sled::Db,
    utxos: Tree,
    blocks: Tree,
    meta: Tree,
}

pub(crate) fn backend(e: sled::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn decode_utxo(bytes: &[u8]) -> Result<BsqUtxo, StoreError> {
    wire::decode_versioned(RECORD_VERSION, bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn encode_utxo(utxo: &BsqUtxo) -> Result<Vec<u8>, StoreError> {
    wire::encode_versioned(RECORD_VERSION, utxo).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Open a sled database, retrying while a previous handle (same process
/// or one shutting down) still holds the file lock.
fn open_sled(path: &Path) -> Result<sled::Db, Box<dyn std::error::Error>> {
    let retry_delays_ms: [u64; 3] = [200, 500, 1000];

    let mut last_err = match sled::open(path) {
        Ok(db) => return Ok(db),
        Err(e) if is_lock_error(&e) => e,
        Err(e) => return Err(e.into()),
    };

    for delay_ms in retry_delays_ms {
        log::warn!(
            "sled lock held at {}, retrying in {}ms",
            path.display(),
            delay_ms
        );
        std::thread::sleep(std::time::Duration::from_millis(delay_ms));
        match sled::open(path) {
            Ok(db) => return Ok(db),
            Err(e) if is_lock_error(&e) => last_err = e,
            Err(e) => return Err(e.into()),
        }
    }

    Err(last_err.into())
}

fn is_lock_error(e: &sled::Error) -> bool {
    let msg = e.to_string();
    msg.contains("WouldBlock")
        || msg.contains("Resource temporarily unavailable")
        || msg.contains("lock")
}

impl SledStateStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let db = open_sled(path.as_ref())?;
        let utxos = db.open_tree(TREE_UTXOS)?;
        let blocks = db.open_tree(TREE_BLOCKS)?;
        let meta = db.open_tree(TREE_META)?;
        Ok(Self {
            db,
            utxos,
            blocks,
            meta,
        })
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Read view over the derived blocks committed with this state.
    pub fn block_store(&self) -> BlockStore {
        BlockStore::new(self.blocks.clone(), self.meta.clone())
    }

    /// Copy every entry into memory (key order).
    pub fn snapshot(&self) -> Result<UtxoSet, StoreError> {
        let mut set = UtxoSet::new();
        for item in self.utxos.iter() {
            let (key, value) = item.map_err(backend)?;
            let text = std::str::from_utf8(&key).map_err(|e| StoreError::Corrupt(e.to_string()))?;
            let output_ref: OutputRef = text
                .parse()
                .map_err(|e: bsq_core::OutputRefError| StoreError::Corrupt(e.to_string()))?;
            set.insert(output_ref, decode_utxo(&value)?)?;
        }
        Ok(set)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush().map_err(backend)?;
        Ok(())
    }
}

impl BsqStateStore for SledStateStore {
    fn get(&self, key: &OutputRef) -> Result<Option<BsqUtxo>, StoreError> {
        match self.utxos.get(key.to_string().as_bytes()).map_err(backend)? {
            Some(bytes) => Ok(Some(decode_utxo(&bytes)?)),
            None => Ok(None),
        }
    }

    fn insert(&mut self, key: OutputRef, utxo: BsqUtxo) -> Result<(), StoreError> {
        self.utxos
            .insert(key.to_string().as_bytes(), encode_utxo(&utxo)?)
            .map_err(backend)?;
        Ok(())
    }

    fn remove(&mut self, key: &OutputRef) -> Result<Option<BsqUtxo>, StoreError> {
        match self.utxos.remove(key.to_string().as_bytes()).map_err(backend)? {
            Some(bytes) => Ok(Some(decode_utxo(&bytes)?)),
            None => Ok(None),
        }
    }

    fn apply_batch(&mut self, writes: Vec<(OutputRef, Option<BsqUtxo>)>) -> Result<(), StoreError> {
        let mut batch = sled::Batch::default();
        for (key, entry) in writes {
            let key = key.to_string();
            match entry {
                Some(utxo) => batch.insert(key.as_bytes(), encode_utxo(&utxo)?),
                None => batch.remove(key.as_bytes()),
            }
        }
        self.utxos.apply_batch(batch).map_err(backend)?;
        self.flush()
    }

    fn commit_block(
        &mut self,
        writes: Vec<(OutputRef, Option<BsqUtxo>)>,
        block: &BsqBlock,
    ) -> Result<(), StoreError> {
        // Serialize outside the transaction; the closure may be retried
        let mut entries: Vec<(String, Option<Vec<u8>>)> = Vec::with_capacity(writes.len());
        for (key, entry) in &writes {
            entries.push((key.to_string(), entry.as_ref().map(encode_utxo).transpose()?));
        }
        let block_bytes = block
            .to_bytes()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let height = block.height;

        (&self.utxos, &self.blocks, &self.meta)
            .transaction(|(tx_utxos, tx_blocks, tx_meta)| {
                for (key, entry) in &entries {
                    match entry {
                        Some(bytes) => {
                            tx_utxos.insert(key.as_bytes(), bytes.as_slice())?;
                        }
                        None => {
                            tx_utxos.remove(key.as_bytes())?;
                        }
                    }
                }
                if let Some(stored) = tx_meta.get(HEAD_KEY)? {
                    let head = decode_head(&stored).map_err(ConflictableTransactionError::Abort)?;
                    if height <= head {
                        return Err(ConflictableTransactionError::Abort(StoreError::Backend(
                            format!("block {} does not extend stored head {}", height, head),
                        )));
                    }
                }
                tx_blocks.insert(&height.to_be_bytes()[..], block_bytes.as_slice())?;
                tx_meta.insert(HEAD_KEY, &height.to_le_bytes()[..])?;
                Ok(())
            })
            .map_err(|e: TransactionError<StoreError>| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => backend(e),
            })?;

        log::debug!("Committed block {} with {} state writes", height, entries.len());
        self.flush()
    }
}

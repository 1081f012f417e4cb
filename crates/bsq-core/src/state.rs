// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - LEDGER STATE (UTXO SET)
//
// Mapping OutputRef → remaining token value. Mutated only by spending
// (remove) and by output assignment (insert).
//
// The store is an explicit object handed to every classification call.
// There is no process-wide ledger: independent sync runs (tests, recompute
// from a height) each own an isolated store.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::output_ref::OutputRef;
use crate::{BsqBlock, TxOutputType};

/// An unspent token-bearing output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BsqUtxo {
    /// Token value held by the output (BSQ satoshis)
    pub value: u64,
    /// Height of the block that created the output
    pub height: u64,
    pub output_type: TxOutputType,
}

/// Storage collaborator failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend I/O failed
    Backend(String),
    /// Stored bytes could not be decoded
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(e) => write!(f, "State store backend error: {}", e),
            Self::Corrupt(e) => write!(f, "State store corrupt entry: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Key-value ledger state keyed by `OutputRef`.
pub trait BsqStateStore {
    fn get(&self, key: &OutputRef) -> Result<Option<BsqUtxo>, StoreError>;

    fn insert(&mut self, key: OutputRef, utxo: BsqUtxo) -> Result<(), StoreError>;

    /// Remove and return the entry, if present.
    fn remove(&mut self, key: &OutputRef) -> Result<Option<BsqUtxo>, StoreError>;

    /// Apply staged writes (`None` = delete). Backends that can write a batch
    /// atomically override this.
    fn apply_batch(&mut self, writes: Vec<(OutputRef, Option<BsqUtxo>)>) -> Result<(), StoreError> {
        for (key, entry) in writes {
            match entry {
                Some(utxo) => self.insert(key, utxo)?,
                None => {
                    self.remove(&key)?;
                }
            }
        }
        Ok(())
    }

    /// Commit one derived block: its staged writes and the block itself.
    /// Stores that persist blocks must write both in one atomic step, so a
    /// crash can never leave the state ahead of the stored head. The default
    /// keeps no blocks and only applies the writes.
    fn commit_block(
        &mut self,
        writes: Vec<(OutputRef, Option<BsqUtxo>)>,
        _block: &BsqBlock,
    ) -> Result<(), StoreError> {
        self.apply_batch(writes)
    }
}

impl<S: BsqStateStore + ?Sized> BsqStateStore for &mut S {
    fn get(&self, key: &OutputRef) -> Result<Option<BsqUtxo>, StoreError> {
        (**self).get(key)
    }

    fn insert(&mut self, key: OutputRef, utxo: BsqUtxo) -> Result<(), StoreError> {
        (**self).insert(key, utxo)
    }

    fn remove(&mut self, key: &OutputRef) -> Result<Option<BsqUtxo>, StoreError> {
        (**self).remove(key)
    }

    fn apply_batch(&mut self, writes: Vec<(OutputRef, Option<BsqUtxo>)>) -> Result<(), StoreError> {
        (**self).apply_batch(writes)
    }

    fn commit_block(
        &mut self,
        writes: Vec<(OutputRef, Option<BsqUtxo>)>,
        block: &BsqBlock,
    ) -> Result<(), StoreError> {
        (**self).commit_block(writes, block)
    }
}

/// In-memory UTXO set.
///
/// BTreeMap so that iteration (and anything derived from it, like
/// `state_root`) is identical on every node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoSet {
    entries: BTreeMap<OutputRef, BsqUtxo>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutputRef, &BsqUtxo)> {
        self.entries.iter()
    }

    pub fn contains(&self, key: &OutputRef) -> bool {
        self.entries.contains_key(key)
    }

    /// Sum of all unspent token value.
    pub fn total_value(&self) -> u128 {
        self.entries.values().map(|u| u.value as u128).sum()
    }

    /// Deterministic digest over sorted (output_ref, value) pairs.
    /// Two nodes agree on the ledger iff their roots match.
    pub fn state_root(&self) -> String {
        let mut data = Vec::new();
        for (key, utxo) in &self.entries {
            data.extend_from_slice(key.to_string().as_bytes());
            data.extend_from_slice(&utxo.value.to_le_bytes());
            data.extend_from_slice(&utxo.height.to_le_bytes());
        }
        hex::encode(bsq_crypto::sha256(&data))
    }
}

impl BsqStateStore for UtxoSet {
    fn get(&self, key: &OutputRef) -> Result<Option<BsqUtxo>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn insert(&mut self, key: OutputRef, utxo: BsqUtxo) -> Result<(), StoreError> {
        self.entries.insert(key, utxo);
        Ok(())
    }

    fn remove(&mut self, key: &OutputRef) -> Result<Option<BsqUtxo>, StoreError> {
        Ok(self.entries.remove(key))
    }
}

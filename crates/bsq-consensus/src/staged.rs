//! Write overlay for atomic per-block application.
//!
//! Reads fall through to the base store, writes are buffered. A block is
//! classified entirely against the overlay; the buffered writes reach the
//! base store in one atomic write (`commit_block`) only if the whole block
//! succeeded.

use std::collections::BTreeMap;

use bsq_core::{BsqStateStore, BsqUtxo, OutputRef, StoreError};

/// Buffered writes, `None` = removed.
pub type StagedWrites = Vec<(OutputRef, Option<BsqUtxo>)>;

pub struct StagedState<'a, S: BsqStateStore> {
    base: &'a mut S,
    writes: BTreeMap<OutputRef, Option<BsqUtxo>>,
}

impl<'a, S: BsqStateStore> StagedState<'a, S> {
    pub fn new(base: &'a mut S) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Detach the buffered writes without touching the base store.
    pub fn into_writes(self) -> StagedWrites {
        self.writes.into_iter().collect()
    }

    /// Write everything through to the base store.
    pub fn commit(self) -> Result<usize, StoreError> {
        let count = self.writes.len();
        let writes: StagedWrites = self.writes.into_iter().collect();
        self.base.apply_batch(writes)?;
        Ok(count)
    }
}

impl<S: BsqStateStore> BsqStateStore for StagedState<'_, S> {
    fn get(&self, key: &OutputRef) -> Result<Option<BsqUtxo>, StoreError> {
        match self.writes.get(key) {
            Some(entry) => Ok(entry.clone()),
            None => self.base.get(key),
        }
    }

    fn insert(&mut self, key: OutputRef, utxo: BsqUtxo) -> Result<(), StoreError> {
        self.writes.insert(key, Some(utxo));
        Ok(())
    }

    fn remove(&mut self, key: &OutputRef) -> Result<Option<BsqUtxo>, StoreError> {
        let previous = self.get(key)?;
        if previous.is_some() {
            self.writes.insert(key.clone(), None);
        }
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsq_core::{TxOutputType, UtxoSet};

    fn utxo(value: u64) -> BsqUtxo {
        BsqUtxo {
            value,
            height: 3,
            output_type: TxOutputType::BsqOutput,
        }
    }

    #[test]
    fn test_reads_see_staged_writes() {
        let mut base = UtxoSet::new();
        base.insert(OutputRef::new("a", 0), utxo(10)).unwrap();

        let mut staged = StagedState::new(&mut base);
        assert_eq!(staged.remove(&OutputRef::new("a", 0)).unwrap(), Some(utxo(10)));
        assert_eq!(staged.get(&OutputRef::new("a", 0)).unwrap(), None);
        staged.insert(OutputRef::new("b", 1), utxo(4)).unwrap();
        assert_eq!(staged.get(&OutputRef::new("b", 1)).unwrap(), Some(utxo(4)));
        assert_eq!(staged.pending_writes(), 2);
    }

    #[test]
    fn test_drop_discards() {
        let mut base = UtxoSet::new();
        base.insert(OutputRef::new("a", 0), utxo(10)).unwrap();
        {
            let mut staged = StagedState::new(&mut base);
            staged.remove(&OutputRef::new("a", 0)).unwrap();
            staged.insert(OutputRef::new("b", 0), utxo(10)).unwrap();
        }
        assert!(base.contains(&OutputRef::new("a", 0)));
        assert!(!base.contains(&OutputRef::new("b", 0)));
    }

    #[test]
    fn test_commit_writes_through() {
        let mut base = UtxoSet::new();
        base.insert(OutputRef::new("a", 0), utxo(10)).unwrap();

        let mut staged = StagedState::new(&mut base);
        staged.remove(&OutputRef::new("a", 0)).unwrap();
        staged.insert(OutputRef::new("b", 0), utxo(6)).unwrap();
        staged.insert(OutputRef::new("b", 1), utxo(4)).unwrap();
        assert_eq!(staged.commit().unwrap(), 3);

        assert!(!base.contains(&OutputRef::new("a", 0)));
        assert_eq!(base.total_value(), 10);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut base = UtxoSet::new();
        let mut staged = StagedState::new(&mut base);
        assert_eq!(staged.remove(&OutputRef::new("x", 0)).unwrap(), None);
        assert_eq!(staged.pending_writes(), 0);
    }
}

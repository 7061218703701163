use std::cell::RefCell;

use rollupdb_costs::{CostResult, CostsExt, OperationCost};

use crate::{Hash, MerkleTreeError, TreeBatch, TreeStore};

/// A store that keeps every committed change in memory on top of a read-only
/// base store.
///
/// Used to run writes speculatively: the base is never modified, and the
/// accumulated changes can be dropped or taken out with
/// [`OverlayStore::into_batch`] and committed to the base later.
pub struct OverlayStore<'a, S> {
    base: &'a S,
    pending: RefCell<TreeBatch>,
}

impl<'a, S: TreeStore> OverlayStore<'a, S> {
    /// Start an empty overlay over `base`.
    pub fn new(base: &'a S) -> Self {
        OverlayStore {
            base,
            pending: RefCell::new(TreeBatch::default()),
        }
    }

    /// Changes committed to the overlay so far.
    pub fn into_batch(self) -> TreeBatch {
        self.pending.into_inner()
    }
}

impl<S: TreeStore> TreeStore for OverlayStore<'_, S> {
    fn get_node(&self, key: &Hash) -> CostResult<Option<Vec<u8>>, MerkleTreeError> {
        if let Some(value) = self.pending.borrow().nodes.get(key) {
            let loaded = value.as_ref().map(Vec::len).unwrap_or_default();
            return Ok(value.clone()).wrap_with_cost(OperationCost::lookup(loaded));
        }
        self.base.get_node(key)
    }

    fn get_ref_count(&self, key: &Hash) -> CostResult<u32, MerkleTreeError> {
        if let Some(count) = self.pending.borrow().ref_counts.get(key) {
            return Ok(*count).wrap_with_cost(OperationCost::lookup(4));
        }
        self.base.get_ref_count(key)
    }

    fn get_meta(&self, name: &[u8]) -> CostResult<Option<Vec<u8>>, MerkleTreeError> {
        if let Some(value) = self.pending.borrow().meta.get(name) {
            return Ok(Some(value.clone())).wrap_with_cost(OperationCost::lookup(value.len()));
        }
        self.base.get_meta(name)
    }

    fn commit(&self, batch: TreeBatch) -> CostResult<(), MerkleTreeError> {
        self.pending.borrow_mut().merge(batch);
        Ok(()).wrap_with_cost(OperationCost::default())
    }
}

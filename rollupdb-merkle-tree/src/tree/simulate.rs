use rollupdb_costs::{CostResult, CostsExt, OperationCost, cost_return_on_error};

use super::MerkleTree;
use crate::{Hash, HashPath, MerkleTreeError, OverlayStore, TreeStore, hasher::TreeHasher};

/// Outcome of applying additions speculatively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedAdditions {
    /// Root before the first addition.
    pub old_root: Hash,
    /// Hash path of each addition's index right before it was applied.
    pub old_paths: Vec<HashPath>,
    /// Hash path of each addition's index right after it was applied.
    pub new_paths: Vec<HashPath>,
    /// Root after each addition.
    pub new_roots: Vec<Hash>,
}

impl<H: TreeHasher + Clone> MerkleTree<H> {
    /// Apply `(index, value)` additions in order without persisting anything,
    /// reporting the hash paths and roots each one would produce.
    ///
    /// The additions run against a copy of this tree over an
    /// [`OverlayStore`] that is dropped afterwards; neither `self` nor
    /// `store` changes.
    pub fn simulate_additions<S: TreeStore, V: AsRef<[u8]>>(
        &self,
        store: &S,
        additions: &[(u64, V)],
    ) -> CostResult<SimulatedAdditions, MerkleTreeError> {
        let mut cost = OperationCost::default();
        let overlay = OverlayStore::new(store);
        let mut scratch = self.clone();

        let mut old_paths = Vec::with_capacity(additions.len());
        let mut new_paths = Vec::with_capacity(additions.len());
        let mut new_roots = Vec::with_capacity(additions.len());
        for (index, value) in additions {
            old_paths.push(cost_return_on_error!(
                &mut cost,
                scratch.get_hash_path(&overlay, *index)
            ));
            new_roots.push(cost_return_on_error!(
                &mut cost,
                scratch.put(&overlay, *index, value.as_ref())
            ));
            new_paths.push(cost_return_on_error!(
                &mut cost,
                scratch.get_hash_path(&overlay, *index)
            ));
        }

        Ok(SimulatedAdditions {
            old_root: self.root,
            old_paths,
            new_paths,
            new_roots,
        })
        .wrap_with_cost(cost)
    }
}

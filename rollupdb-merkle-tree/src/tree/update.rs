use rollupdb_costs::{
    CostResult, CostsExt, OperationCost, cost_return_on_error, cost_return_on_error_no_add,
};
use tracing::debug;

use super::MerkleTree;
use crate::{
    Hash, MerkleTreeError, TreeStore, hasher::TreeHasher, node::pair_bytes,
    working_set::WorkingSet,
};

impl<H: TreeHasher> MerkleTree<H> {
    /// Set the leaf at `index` to the hash of `value` and return the new root.
    ///
    /// Rewrites the path from the root down to the leaf, stores the new pair
    /// nodes, drops nodes no longer referenced and updates the metadata
    /// record, all in one committed batch.
    pub fn put<S: TreeStore>(
        &mut self,
        store: &S,
        index: u64,
        value: &[u8],
    ) -> CostResult<Hash, MerkleTreeError> {
        let mut cost = OperationCost::default();
        cost_return_on_error_no_add!(&cost, self.check_index(index));

        let leaf = self.hasher.hash_leaf(value);
        cost.hash_node_calls += 1;

        let mut ws = WorkingSet::new(store, &self.zero_hashes);
        let new_root = cost_return_on_error!(
            &mut cost,
            self.update_node(&mut ws, self.root, leaf, index, self.depth)
        );
        let batch = cost_return_on_error!(&mut cost, self.link_root(ws, new_root));
        let new_size = self.size.max(index + 1);
        cost_return_on_error!(&mut cost, self.commit(store, batch, new_root, new_size));

        debug!(
            tree = %self.display_name(),
            index,
            size = self.size,
            root = %hex::encode(new_root),
            "updated element"
        );
        Ok(new_root).wrap_with_cost(cost)
    }

    /// Replace the leaf below the node `root` at `height` and return the
    /// node's new hash. `index` is relative to the node.
    fn update_node<S: TreeStore>(
        &self,
        ws: &mut WorkingSet<'_, S>,
        root: Hash,
        leaf: Hash,
        index: u64,
        height: u32,
    ) -> CostResult<Hash, MerkleTreeError> {
        let mut cost = OperationCost::default();
        if height == 0 {
            return Ok(leaf).wrap_with_cost(cost);
        }

        let node = cost_return_on_error!(&mut cost, ws.load_node(&root, height));
        let (mut left, mut right) = ws.children(node, height);
        let child_index = index & ((1u64 << (height - 1)) - 1);
        if (index >> (height - 1)) & 1 == 1 {
            right = cost_return_on_error!(
                &mut cost,
                self.update_node(ws, right, leaf, child_index, height - 1)
            );
        } else {
            left = cost_return_on_error!(
                &mut cost,
                self.update_node(ws, left, leaf, child_index, height - 1)
            );
        }

        let new_root = self.hasher.compress(&left, &right);
        cost.hash_node_calls += 1;
        ws.stage(new_root, pair_bytes(&left, &right));
        Ok(new_root).wrap_with_cost(cost)
    }
}

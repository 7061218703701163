use rollupdb_costs::{
    CostResult, CostsExt, OperationCost, cost_return_on_error, cost_return_on_error_no_add,
};
use tracing::{debug, trace, warn};

use super::MerkleTree;
use crate::{
    Hash, MerkleTreeError, TreeStore,
    hasher::TreeHasher,
    node::{Node, PackedSubtree, pair_bytes},
    working_set::WorkingSet,
};

/// A complete subtree hashed from one chunk of values.
struct Subtree {
    start: u64,
    height: u32,
    root: Hash,
    blob: Vec<u8>,
}

/// Height of the largest aligned power-of-two chunk that starts at `index`
/// and fits in `remaining` values.
pub(crate) fn chunk_height(index: u64, remaining: usize) -> u32 {
    let remaining = remaining as u64;
    let mut height = remaining.next_power_of_two().trailing_zeros();
    while (1u64 << height) > remaining || index % (1u64 << height) != 0 {
        height -= 1;
    }
    height
}

impl<H: TreeHasher> MerkleTree<H> {
    /// Write `values` to consecutive leaves starting at `start_index` and
    /// return the new root.
    ///
    /// Values are split into aligned power-of-two chunks; each chunk is
    /// hashed into a complete subtree and stored as a single packed node.
    /// Every chunk is committed on its own, so a failure part-way leaves the
    /// chunks before it in place and the tree consistent with them.
    ///
    /// Replaying a chunk whose packed subtree is already in place is a no-op;
    /// writing different values over it fails with
    /// [`MerkleTreeError::SubtreeConflict`].
    pub fn put_range<S: TreeStore, V: AsRef<[u8]>>(
        &mut self,
        store: &S,
        start_index: u64,
        values: &[V],
    ) -> CostResult<Hash, MerkleTreeError> {
        let mut cost = OperationCost::default();
        if values.is_empty() {
            return Ok(self.root).wrap_with_cost(cost);
        }
        let last = start_index.saturating_add(values.len() as u64 - 1);
        cost_return_on_error_no_add!(&cost, self.check_index(last));

        let mut index = start_index;
        let mut remaining = values;
        while !remaining.is_empty() {
            let height = chunk_height(index, remaining.len());
            let (chunk, rest) = remaining.split_at(1usize << height);
            cost_return_on_error!(&mut cost, self.put_chunk(store, index, height, chunk));
            index += chunk.len() as u64;
            remaining = rest;
        }

        debug!(
            tree = %self.display_name(),
            start_index,
            count = values.len(),
            size = self.size,
            root = %hex::encode(self.root),
            "updated elements"
        );
        Ok(self.root).wrap_with_cost(cost)
    }

    fn put_chunk<S: TreeStore, V: AsRef<[u8]>>(
        &mut self,
        store: &S,
        start: u64,
        height: u32,
        chunk: &[V],
    ) -> CostResult<(), MerkleTreeError> {
        let mut cost = OperationCost::default();
        let layers = self.hasher.hash_tree_from_values(chunk);
        cost.hash_node_calls += layers.len() as u32;
        let (root, blob) = PackedSubtree::blob_from_layers(&layers);
        let subtree = Subtree {
            start,
            height,
            root,
            blob,
        };
        trace!(
            tree = %self.display_name(),
            start,
            height,
            root = %hex::encode(root),
            "inserting chunk"
        );

        let mut ws = WorkingSet::new(store, &self.zero_hashes);
        let new_root = if root == *self.zero_hashes.at(height) {
            self.root
        } else {
            cost_return_on_error!(
                &mut cost,
                self.insert_subtree(&mut ws, &subtree, self.root, start, self.depth)
            )
        };
        let batch = cost_return_on_error!(&mut cost, self.link_root(ws, new_root));
        let new_size = self.size.max(start + (1u64 << height));
        cost_return_on_error!(&mut cost, self.commit(store, batch, new_root, new_size));
        Ok(()).wrap_with_cost(cost)
    }

    /// Splice `subtree` below the node `root` at `height` and return the
    /// node's new hash. `index` is the subtree start relative to the node.
    fn insert_subtree<S: TreeStore>(
        &self,
        ws: &mut WorkingSet<'_, S>,
        subtree: &Subtree,
        root: Hash,
        index: u64,
        height: u32,
    ) -> CostResult<Hash, MerkleTreeError> {
        let mut cost = OperationCost::default();
        let conflict = || MerkleTreeError::SubtreeConflict {
            index: subtree.start,
            height: subtree.height,
        };

        if height == subtree.height {
            if root == subtree.root {
                warn!(
                    tree = %self.display_name(),
                    start = subtree.start,
                    height,
                    "subtree already in place, skipping"
                );
                return Ok(root).wrap_with_cost(cost);
            }
            if height > 0 {
                let existing = cost_return_on_error!(&mut cost, ws.load_node(&root, height));
                if let Node::Packed(_) = existing {
                    return Err(conflict()).wrap_with_cost(cost);
                }
                ws.stage(subtree.root, subtree.blob.clone());
            }
            return Ok(subtree.root).wrap_with_cost(cost);
        }

        let node = cost_return_on_error!(&mut cost, ws.load_node(&root, height));
        if let Node::Packed(existing) = &node {
            // A packed subtree already covers the whole target region.
            let in_place = existing.hash_at(subtree.height, index >> subtree.height);
            if in_place == subtree.root {
                warn!(
                    tree = %self.display_name(),
                    start = subtree.start,
                    height = subtree.height,
                    "subtree already in place, skipping"
                );
                return Ok(root).wrap_with_cost(cost);
            }
            return Err(conflict()).wrap_with_cost(cost);
        }

        let (mut left, mut right) = ws.children(node, height);
        let child_index = index & ((1u64 << (height - 1)) - 1);
        if (index >> (height - 1)) & 1 == 1 {
            right = cost_return_on_error!(
                &mut cost,
                self.insert_subtree(ws, subtree, right, child_index, height - 1)
            );
        } else {
            left = cost_return_on_error!(
                &mut cost,
                self.insert_subtree(ws, subtree, left, child_index, height - 1)
            );
        }

        let new_root = self.hasher.compress(&left, &right);
        cost.hash_node_calls += 1;
        ws.stage(new_root, pair_bytes(&left, &right));
        Ok(new_root).wrap_with_cost(cost)
    }
}

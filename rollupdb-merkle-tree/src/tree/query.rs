use rollupdb_costs::{CostResult, CostsExt, OperationCost, cost_return_on_error};

use super::MerkleTree;
use crate::{HashPath, MerkleTreeError, TreeStore, hasher::TreeHasher, node::Node, working_set::WorkingSet};

impl<H: TreeHasher> MerkleTree<H> {
    /// Sibling pairs for the leaf at `index`, leaf level first.
    ///
    /// Every index below `2^depth` can be read, including the last leaf of a
    /// depth-32 tree that [`MerkleTree::capacity`] excludes from writes.
    ///
    /// Absent subtrees are filled from the zero ladder and a packed subtree
    /// answers every level below it, so at most one lookup is made per level.
    pub fn get_hash_path<S: TreeStore>(
        &self,
        store: &S,
        index: u64,
    ) -> CostResult<HashPath, MerkleTreeError> {
        let mut cost = OperationCost::default();
        let leaves = 1u64 << self.depth;
        if index >= leaves {
            return Err(MerkleTreeError::IndexOutOfRange {
                index,
                capacity: leaves,
            })
            .wrap_with_cost(cost);
        }

        let ws = WorkingSet::new(store, &self.zero_hashes);
        let mut pairs = Vec::with_capacity(self.depth as usize);
        let mut current = self.root;
        let mut height = self.depth;
        while height > 0 {
            let node = cost_return_on_error!(&mut cost, ws.load_node(&current, height));
            match node {
                Node::ImplicitZero => {
                    for level in (0..height).rev() {
                        let zero = *self.zero_hashes.at(level);
                        pairs.push((zero, zero));
                    }
                    break;
                }
                Node::Packed(packed) => {
                    let relative = index & ((1u64 << height) - 1);
                    pairs.extend(packed.sibling_pairs(relative).into_iter().rev());
                    break;
                }
                Node::Pair { left, right } => {
                    pairs.push((left, right));
                    current = if (index >> (height - 1)) & 1 == 1 {
                        right
                    } else {
                        left
                    };
                    height -= 1;
                }
            }
        }

        pairs.reverse();
        Ok(HashPath::new(pairs)).wrap_with_cost(cost)
    }
}

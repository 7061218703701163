//! Changes accumulated by a single tree write before they are committed.
//!
//! Writes stage every node they compute here. Only nodes reachable from the
//! new root end up in the batch: linking the new root retains it (and,
//! recursively, any child seen for the first time) and unlinking the old root
//! releases it (and, recursively, any child whose last reference it held).

use std::collections::HashMap;

use rollupdb_costs::{CostResult, CostsExt, OperationCost, cost_return_on_error};
use tracing::trace;

use crate::{
    Hash, MerkleTreeError, TreeBatch, TreeStore,
    node::{Node, PAIR_SIZE, split_pair},
    zero_hashes::ZeroHashes,
};

pub(crate) struct WorkingSet<'a, S> {
    store: &'a S,
    zero_hashes: &'a ZeroHashes,
    staged: HashMap<Hash, Vec<u8>>,
    /// Children of pair nodes replaced by a packed blob, released once the
    /// new root is linked.
    detached: Vec<(Hash, u32)>,
    batch: TreeBatch,
}

impl<'a, S: TreeStore> WorkingSet<'a, S> {
    pub(crate) fn new(store: &'a S, zero_hashes: &'a ZeroHashes) -> Self {
        WorkingSet {
            store,
            zero_hashes,
            staged: HashMap::new(),
            detached: Vec::new(),
            batch: TreeBatch::default(),
        }
    }

    fn is_zero(&self, key: &Hash, height: u32) -> bool {
        self.zero_hashes.at(height) == key
    }

    /// Record bytes for a node that may become reachable.
    pub(crate) fn stage(&mut self, key: Hash, bytes: Vec<u8>) {
        self.staged.entry(key).or_insert(bytes);
    }

    /// Bytes currently stored for `key`, including changes of this write.
    fn stored_bytes(&self, key: &Hash) -> CostResult<Option<Vec<u8>>, MerkleTreeError> {
        match self.batch.nodes.get(key) {
            Some(value) => Ok(value.clone()).wrap_with_cost(OperationCost::default()),
            None => self.store.get_node(key),
        }
    }

    fn ref_count(&self, key: &Hash) -> CostResult<u32, MerkleTreeError> {
        match self.batch.ref_counts.get(key) {
            Some(count) => Ok(*count).wrap_with_cost(OperationCost::default()),
            None => self.store.get_ref_count(key),
        }
    }

    /// Resolve the node with hash `key` at `height > 0`.
    pub(crate) fn load_node(&self, key: &Hash, height: u32) -> CostResult<Node, MerkleTreeError> {
        let mut cost = OperationCost::default();
        if self.is_zero(key, height) {
            return Ok(Node::ImplicitZero).wrap_with_cost(cost);
        }
        let bytes = match self.staged.get(key) {
            Some(bytes) => Some(bytes.clone()),
            None => cost_return_on_error!(&mut cost, self.stored_bytes(key)),
        };
        let node = match bytes {
            Some(bytes) => Node::decode(bytes, height),
            None => Ok(Node::ImplicitZero),
        };
        node.wrap_with_cost(cost)
    }

    /// Child hashes of `node` at `height`.
    ///
    /// The halves of a packed subtree are staged so the walk can continue
    /// into them.
    pub(crate) fn children(&mut self, node: Node, height: u32) -> (Hash, Hash) {
        match node {
            Node::ImplicitZero => {
                let zero = *self.zero_hashes.at(height - 1);
                (zero, zero)
            }
            Node::Pair { left, right } => (left, right),
            Node::Packed(packed) => {
                let (left, right) = packed.top_children();
                let (left_bytes, right_bytes) = packed.split();
                self.stage(left, left_bytes);
                self.stage(right, right_bytes);
                (left, right)
            }
        }
    }

    /// Add a reference to the node `key` at `height`, storing it (and
    /// retaining its children) if it had none.
    pub(crate) fn retain(&mut self, key: &Hash, height: u32) -> CostResult<(), MerkleTreeError> {
        let mut cost = OperationCost::default();
        if height == 0 || self.is_zero(key, height) {
            return Ok(()).wrap_with_cost(cost);
        }
        let count = cost_return_on_error!(&mut cost, self.ref_count(key));
        if count > 0 {
            self.batch.ref_counts.insert(*key, count + 1);
            if let Some(bytes) = self.staged.remove(key) {
                if bytes.len() > PAIR_SIZE {
                    cost_return_on_error!(&mut cost, self.pack(key, height, bytes));
                }
            }
            return Ok(()).wrap_with_cost(cost);
        }

        let bytes = match self.staged.remove(key) {
            Some(bytes) => bytes,
            None => match cost_return_on_error!(&mut cost, self.stored_bytes(key)) {
                Some(bytes) => bytes,
                None => {
                    return Err(MerkleTreeError::CorruptedData(format!(
                        "node {} at height {height} is referenced but unknown",
                        hex::encode(key)
                    )))
                    .wrap_with_cost(cost);
                }
            },
        };
        trace!(node = %hex::encode(key), height, len = bytes.len(), "storing node");

        let children = (bytes.len() == PAIR_SIZE).then(|| split_pair(&bytes));
        self.batch.nodes.insert(*key, Some(bytes));
        self.batch.ref_counts.insert(*key, 1);
        if let Some((left, right)) = children {
            cost_return_on_error!(&mut cost, self.retain(&left, height - 1));
            cost_return_on_error!(&mut cost, self.retain(&right, height - 1));
        }
        Ok(()).wrap_with_cost(cost)
    }

    /// Store a packed blob in place of the pair node already stored under
    /// `key`, so the subtree is recognised as packed wherever it occurs.
    ///
    /// A packed node holds no references, so the pair's children are
    /// detached.
    fn pack(
        &mut self,
        key: &Hash,
        height: u32,
        blob: Vec<u8>,
    ) -> CostResult<(), MerkleTreeError> {
        let mut cost = OperationCost::default();
        let stored = cost_return_on_error!(&mut cost, self.stored_bytes(key));
        if let Some(bytes) = stored.filter(|bytes| bytes.len() == PAIR_SIZE) {
            trace!(node = %hex::encode(key), height, len = blob.len(), "packing node");
            let (left, right) = split_pair(&bytes);
            self.detached.push((left, height - 1));
            self.detached.push((right, height - 1));
            self.batch.nodes.insert(*key, Some(blob));
        }
        Ok(()).wrap_with_cost(cost)
    }

    /// Release the children detached by [`Self::pack`].
    pub(crate) fn release_detached(&mut self) -> CostResult<(), MerkleTreeError> {
        let mut cost = OperationCost::default();
        for (key, height) in std::mem::take(&mut self.detached) {
            cost_return_on_error!(&mut cost, self.release(&key, height));
        }
        Ok(()).wrap_with_cost(cost)
    }

    /// Drop a reference to the node `key` at `height`, deleting it (and
    /// releasing its children) when it was the last one.
    pub(crate) fn release(&mut self, key: &Hash, height: u32) -> CostResult<(), MerkleTreeError> {
        let mut cost = OperationCost::default();
        if height == 0 || self.is_zero(key, height) {
            return Ok(()).wrap_with_cost(cost);
        }
        let count = cost_return_on_error!(&mut cost, self.ref_count(key));
        match count {
            0 => return Ok(()).wrap_with_cost(cost),
            1 => {}
            _ => {
                self.batch.ref_counts.insert(*key, count - 1);
                return Ok(()).wrap_with_cost(cost);
            }
        }

        let bytes = cost_return_on_error!(&mut cost, self.stored_bytes(key));
        trace!(node = %hex::encode(key), height, "deleting node");
        self.batch.nodes.insert(*key, None);
        self.batch.ref_counts.insert(*key, 0);
        if let Some(bytes) = bytes {
            if bytes.len() == PAIR_SIZE {
                let (left, right) = split_pair(&bytes);
                cost_return_on_error!(&mut cost, self.release(&left, height - 1));
                cost_return_on_error!(&mut cost, self.release(&right, height - 1));
            }
        }
        Ok(()).wrap_with_cost(cost)
    }

    pub(crate) fn into_batch(self) -> TreeBatch {
        self.batch
    }
}

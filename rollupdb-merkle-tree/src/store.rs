use std::collections::BTreeMap;

use rollupdb_costs::CostResult;

use crate::{Hash, MerkleTreeError};

/// Storage abstraction for Merkle tree nodes, node reference counts and tree
/// metadata.
///
/// A missing key is `Ok(None)` (or a zero reference count), never an error.
pub trait TreeStore {
    /// Bytes stored under a node hash.
    fn get_node(&self, key: &Hash) -> CostResult<Option<Vec<u8>>, MerkleTreeError>;

    /// Number of live references to a stored node.
    fn get_ref_count(&self, key: &Hash) -> CostResult<u32, MerkleTreeError>;

    /// Metadata record stored under a tree name.
    fn get_meta(&self, name: &[u8]) -> CostResult<Option<Vec<u8>>, MerkleTreeError>;

    /// Apply every change in `batch` atomically.
    fn commit(&self, batch: TreeBatch) -> CostResult<(), MerkleTreeError>;
}

impl<S: TreeStore + ?Sized> TreeStore for &S {
    fn get_node(&self, key: &Hash) -> CostResult<Option<Vec<u8>>, MerkleTreeError> {
        (**self).get_node(key)
    }

    fn get_ref_count(&self, key: &Hash) -> CostResult<u32, MerkleTreeError> {
        (**self).get_ref_count(key)
    }

    fn get_meta(&self, name: &[u8]) -> CostResult<Option<Vec<u8>>, MerkleTreeError> {
        (**self).get_meta(name)
    }

    fn commit(&self, batch: TreeBatch) -> CostResult<(), MerkleTreeError> {
        (**self).commit(batch)
    }
}

/// Changes produced by one tree write.
///
/// `nodes` maps a hash to its new bytes or to `None` for a deletion;
/// a reference count of zero removes the count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeBatch {
    /// Node writes and deletions.
    pub nodes: BTreeMap<Hash, Option<Vec<u8>>>,
    /// New reference counts.
    pub ref_counts: BTreeMap<Hash, u32>,
    /// Metadata records by tree name.
    pub meta: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl TreeBatch {
    /// `true` if the batch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.ref_counts.is_empty() && self.meta.is_empty()
    }

    /// Layer `other` on top of this batch; later changes win.
    pub fn merge(&mut self, other: TreeBatch) {
        self.nodes.extend(other.nodes);
        self.ref_counts.extend(other.ref_counts);
        self.meta.extend(other.meta);
    }
}

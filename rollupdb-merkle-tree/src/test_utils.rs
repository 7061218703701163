use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
};

use rollupdb_costs::{CostResult, CostsExt, OperationCost};

use crate::{
    Blake3Hasher, Hash, HashPath, MerkleTree, MerkleTreeConfig, MerkleTreeError, TreeBatch,
    TreeStore, hasher::TreeHasher, zero_hashes::ZeroHashes,
};

/// In-memory store for tests.
#[derive(Default)]
pub(crate) struct MemStore {
    nodes: RefCell<HashMap<Hash, Vec<u8>>>,
    ref_counts: RefCell<HashMap<Hash, u32>>,
    meta: RefCell<HashMap<Vec<u8>, Vec<u8>>>,
    fail_commits: Cell<bool>,
    commits: Cell<usize>,
}

impl MemStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub(crate) fn has_node(&self, key: &Hash) -> bool {
        self.nodes.borrow().contains_key(key)
    }

    pub(crate) fn ref_count_of(&self, key: &Hash) -> u32 {
        self.ref_counts.borrow().get(key).copied().unwrap_or_default()
    }

    pub(crate) fn node_keys(&self) -> Vec<Hash> {
        let mut keys: Vec<Hash> = self.nodes.borrow().keys().copied().collect();
        keys.sort();
        keys
    }

    pub(crate) fn commits(&self) -> usize {
        self.commits.get()
    }

    /// Make every following commit fail until reset.
    pub(crate) fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.set(fail);
    }
}

impl TreeStore for MemStore {
    fn get_node(&self, key: &Hash) -> CostResult<Option<Vec<u8>>, MerkleTreeError> {
        let value = self.nodes.borrow().get(key).cloned();
        let loaded = value.as_ref().map(Vec::len).unwrap_or_default();
        Ok(value).wrap_with_cost(OperationCost::lookup(loaded))
    }

    fn get_ref_count(&self, key: &Hash) -> CostResult<u32, MerkleTreeError> {
        Ok(self.ref_count_of(key)).wrap_with_cost(OperationCost::lookup(4))
    }

    fn get_meta(&self, name: &[u8]) -> CostResult<Option<Vec<u8>>, MerkleTreeError> {
        let value = self.meta.borrow().get(name).cloned();
        let loaded = value.as_ref().map(Vec::len).unwrap_or_default();
        Ok(value).wrap_with_cost(OperationCost::lookup(loaded))
    }

    fn commit(&self, batch: TreeBatch) -> CostResult<(), MerkleTreeError> {
        if self.fail_commits.get() {
            return Err(MerkleTreeError::StoreError("injected failure".to_string()))
                .wrap_with_cost(OperationCost::default());
        }
        let mut cost = OperationCost::default();
        let mut nodes = self.nodes.borrow_mut();
        for (key, value) in batch.nodes {
            match value {
                Some(bytes) => {
                    cost.storage_written_bytes += (32 + bytes.len()) as u64;
                    nodes.insert(key, bytes);
                }
                None => {
                    if let Some(bytes) = nodes.remove(&key) {
                        cost.storage_freed_bytes += (32 + bytes.len()) as u64;
                    }
                }
            }
        }
        let mut ref_counts = self.ref_counts.borrow_mut();
        for (key, count) in batch.ref_counts {
            if count == 0 {
                ref_counts.remove(&key);
            } else {
                ref_counts.insert(key, count);
            }
        }
        let mut meta = self.meta.borrow_mut();
        for (name, record) in batch.meta {
            cost.storage_written_bytes += (name.len() + record.len()) as u64;
            meta.insert(name, record);
        }
        self.commits.set(self.commits.get() + 1);
        Ok(()).wrap_with_cost(cost)
    }
}

pub(crate) fn new_tree(depth: u32) -> MerkleTree {
    MerkleTree::new("test", MerkleTreeConfig::with_depth(depth), Blake3Hasher).expect("new tree")
}

pub(crate) fn leaf_value(i: u64) -> Vec<u8> {
    let mut value = vec![0u8; 64];
    value[..8].copy_from_slice(&i.to_le_bytes());
    value[63] = 0xff;
    value
}

/// Naive Merkle tree over a sparse set of leaves.
pub(crate) struct ReferenceTree {
    hasher: Blake3Hasher,
    zero_hashes: ZeroHashes,
    depth: u32,
    pub(crate) leaves: BTreeMap<u64, Vec<u8>>,
}

impl ReferenceTree {
    pub(crate) fn new(depth: u32) -> Self {
        ReferenceTree {
            hasher: Blake3Hasher,
            zero_hashes: ZeroHashes::new(&Blake3Hasher, depth, crate::LEAF_BYTES)
                .expect("zero hashes"),
            depth,
            leaves: BTreeMap::new(),
        }
    }

    pub(crate) fn set(&mut self, index: u64, value: Vec<u8>) {
        self.leaves.insert(index, value);
    }

    pub(crate) fn size(&self) -> u64 {
        self.leaves.keys().next_back().map(|i| i + 1).unwrap_or_default()
    }

    fn subtree(&self, start: u64, height: u32) -> Hash {
        let end = start + (1u64 << height);
        if self.leaves.range(start..end).next().is_none() {
            return *self.zero_hashes.at(height);
        }
        if height == 0 {
            return self.hasher.hash_leaf(&self.leaves[&start]);
        }
        let mid = start + (1u64 << (height - 1));
        self.hasher
            .compress(&self.subtree(start, height - 1), &self.subtree(mid, height - 1))
    }

    pub(crate) fn root(&self) -> Hash {
        self.subtree(0, self.depth)
    }

    pub(crate) fn hash_path(&self, index: u64) -> HashPath {
        HashPath::new(
            (0..self.depth)
                .map(|level| {
                    let base = (index >> (level + 1)) << (level + 1);
                    (
                        self.subtree(base, level),
                        self.subtree(base + (1u64 << level), level),
                    )
                })
                .collect(),
        )
    }
}

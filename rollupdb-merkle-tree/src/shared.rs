use parking_lot::RwLock;
use rollupdb_costs::CostResult;

use crate::{
    Hash, HashPath, MerkleTree, MerkleTreeError, SimulatedAdditions, TreeStore,
    hasher::TreeHasher,
};

/// A tree and its store behind one read-write lock.
///
/// Reads share the lock and always see a root, size and node set that belong
/// together; writes are exclusive, so at most one runs at a time.
pub struct SharedTree<S, H> {
    store: S,
    tree: RwLock<MerkleTree<H>>,
}

impl<S: TreeStore, H: TreeHasher> SharedTree<S, H> {
    /// Wrap `tree`, whose nodes live in `store`.
    pub fn new(store: S, tree: MerkleTree<H>) -> Self {
        SharedTree {
            store,
            tree: RwLock::new(tree),
        }
    }

    /// Current root.
    pub fn root(&self) -> Hash {
        self.tree.read().root()
    }

    /// Current size.
    pub fn size(&self) -> u64 {
        self.tree.read().size()
    }

    /// Root and size read under the same lock.
    pub fn root_and_size(&self) -> (Hash, u64) {
        let tree = self.tree.read();
        (tree.root(), tree.size())
    }

    /// See [`MerkleTree::get_hash_path`].
    pub fn get_hash_path(&self, index: u64) -> CostResult<HashPath, MerkleTreeError> {
        self.tree.read().get_hash_path(&self.store, index)
    }

    /// See [`MerkleTree::put`].
    pub fn put(&self, index: u64, value: &[u8]) -> CostResult<Hash, MerkleTreeError> {
        self.tree.write().put(&self.store, index, value)
    }

    /// See [`MerkleTree::put_range`].
    pub fn put_range<V: AsRef<[u8]>>(
        &self,
        start_index: u64,
        values: &[V],
    ) -> CostResult<Hash, MerkleTreeError> {
        self.tree.write().put_range(&self.store, start_index, values)
    }

    /// See [`MerkleTree::sync_from_store`].
    pub fn sync_from_store(&self) -> CostResult<(), MerkleTreeError> {
        self.tree.write().sync_from_store(&self.store)
    }

    /// The store and the tree.
    pub fn into_inner(self) -> (S, MerkleTree<H>) {
        (self.store, self.tree.into_inner())
    }
}

impl<S: TreeStore, H: TreeHasher + Clone> SharedTree<S, H> {
    /// See [`MerkleTree::simulate_additions`].
    pub fn simulate_additions<V: AsRef<[u8]>>(
        &self,
        additions: &[(u64, V)],
    ) -> CostResult<SimulatedAdditions, MerkleTreeError> {
        self.tree.read().simulate_additions(&self.store, additions)
    }
}

//! Fixed-depth Merkle tree over a content-addressed node store.
//!
//! The tree value only holds the current root, size and zero ladder; all
//! nodes live in a [`TreeStore`] passed to each operation. Every write
//! commits its node changes together with the tree's metadata record in one
//! batch, and the in-memory state moves forward only once that batch is
//! committed.

mod bulk;
mod query;
mod simulate;
mod update;


use std::borrow::Cow;

use rollupdb_costs::{
    CostResult, CostsExt, OperationCost, cost_return_on_error, cost_return_on_error_no_add,
};
use tracing::debug;

pub use simulate::SimulatedAdditions;

use crate::{
    Blake3Hasher, Hash, LEAF_BYTES, MerkleTreeConfig, MerkleTreeError, TreeBatch, TreeStore,
    hasher::TreeHasher,
    meta::TreeMeta,
    working_set::WorkingSet,
    zero_hashes::ZeroHashes,
};

/// A named, fixed-depth Merkle tree.
#[derive(Debug, Clone)]
pub struct MerkleTree<H = Blake3Hasher> {
    name: Vec<u8>,
    depth: u32,
    size: u64,
    root: Hash,
    zero_hashes: ZeroHashes,
    hasher: H,
}

impl<H: TreeHasher> MerkleTree<H> {
    /// An empty tree that exists only in memory until its first write.
    pub fn new(
        name: impl Into<Vec<u8>>,
        config: MerkleTreeConfig,
        hasher: H,
    ) -> Result<Self, MerkleTreeError> {
        config.validate()?;
        let zero_hashes = ZeroHashes::new(&hasher, config.depth, config.empty_leaf_len)?;
        Ok(MerkleTree {
            name: name.into(),
            depth: config.depth,
            size: 0,
            root: zero_hashes.empty_root(),
            zero_hashes,
            hasher,
        })
    }

    /// An empty tree whose metadata record is written to `store` right away.
    pub fn create<S: TreeStore>(
        store: &S,
        name: impl Into<Vec<u8>>,
        config: MerkleTreeConfig,
        hasher: H,
    ) -> CostResult<Self, MerkleTreeError> {
        let mut cost = OperationCost::default();
        let mut tree = cost_return_on_error_no_add!(&cost, Self::new(name, config, hasher));
        let (root, size) = (tree.root, tree.size);
        cost_return_on_error!(
            &mut cost,
            tree.commit(store, TreeBatch::default(), root, size)
        );
        debug!(tree = %tree.display_name(), depth = tree.depth, "created tree");
        Ok(tree).wrap_with_cost(cost)
    }

    /// Reconstitute a tree from known state without touching any store.
    pub fn from_state(
        name: impl Into<Vec<u8>>,
        config: MerkleTreeConfig,
        hasher: H,
        root: Hash,
        size: u64,
    ) -> Result<Self, MerkleTreeError> {
        let mut tree = Self::new(name, config, hasher)?;
        if size > tree.capacity() {
            return Err(MerkleTreeError::IndexOutOfRange {
                index: size,
                capacity: tree.capacity(),
            });
        }
        tree.root = root;
        tree.size = size;
        Ok(tree)
    }

    /// Load the tree stored under `name`, with the default empty leaf.
    pub fn open<S: TreeStore>(
        store: &S,
        name: impl Into<Vec<u8>>,
        hasher: H,
    ) -> CostResult<Self, MerkleTreeError> {
        Self::open_with_empty_leaf_len(store, name, LEAF_BYTES, hasher)
    }

    /// Load the tree stored under `name` whose empty leaf is
    /// `empty_leaf_len` zero bytes.
    pub fn open_with_empty_leaf_len<S: TreeStore>(
        store: &S,
        name: impl Into<Vec<u8>>,
        empty_leaf_len: usize,
        hasher: H,
    ) -> CostResult<Self, MerkleTreeError> {
        let mut cost = OperationCost::default();
        let name = name.into();
        let meta = cost_return_on_error!(&mut cost, load_meta(store, &name));
        let config = MerkleTreeConfig {
            depth: meta.depth,
            empty_leaf_len,
        };
        let tree = cost_return_on_error_no_add!(
            &cost,
            Self::from_state(name, config, hasher, meta.root, u64::from(meta.size))
        );
        debug!(
            tree = %tree.display_name(),
            depth = tree.depth,
            size = tree.size,
            root = %hex::encode(tree.root),
            "opened tree"
        );
        Ok(tree).wrap_with_cost(cost)
    }

    /// Reload root and size from the metadata record in `store`.
    pub fn sync_from_store<S: TreeStore>(&mut self, store: &S) -> CostResult<(), MerkleTreeError> {
        let mut cost = OperationCost::default();
        let meta = cost_return_on_error!(&mut cost, load_meta(store, &self.name));
        if meta.depth != self.depth {
            return Err(MerkleTreeError::CorruptedData(format!(
                "tree {} is stored with depth {}, expected {}",
                self.display_name(),
                meta.depth,
                self.depth
            )))
            .wrap_with_cost(cost);
        }
        self.root = meta.root;
        self.size = u64::from(meta.size);
        Ok(()).wrap_with_cost(cost)
    }
}

impl<H> MerkleTree<H> {
    /// Tree name, the key of its metadata record.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Number of levels below the root.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Highest written index plus one.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current root hash.
    pub fn root(&self) -> Hash {
        self.root
    }

    /// Zero hashes for every height of this tree.
    pub fn zero_hashes(&self) -> &ZeroHashes {
        &self.zero_hashes
    }

    /// Hasher the tree was built with.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Number of addressable leaves.
    ///
    /// The size is persisted as a `u32`, so a depth-32 tree holds one leaf
    /// fewer than `2^32`.
    pub fn capacity(&self) -> u64 {
        (1u64 << self.depth).min(u64::from(u32::MAX))
    }

    pub(crate) fn display_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    pub(crate) fn check_index(&self, index: u64) -> Result<(), MerkleTreeError> {
        if index >= self.capacity() {
            return Err(MerkleTreeError::IndexOutOfRange {
                index,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    /// Commit `batch` with the metadata record for `root` and `size`, then
    /// move the in-memory state forward.
    pub(crate) fn commit<S: TreeStore>(
        &mut self,
        store: &S,
        mut batch: TreeBatch,
        root: Hash,
        size: u64,
    ) -> CostResult<(), MerkleTreeError> {
        let mut cost = OperationCost::default();
        let meta = TreeMeta {
            root,
            depth: self.depth,
            size: cost_return_on_error_no_add!(
                &cost,
                u32::try_from(size).map_err(|_| MerkleTreeError::IndexOutOfRange {
                    index: size,
                    capacity: self.capacity(),
                })
            ),
        };
        batch.meta.insert(self.name.clone(), meta.encode().to_vec());
        cost_return_on_error!(&mut cost, store.commit(batch));
        self.root = root;
        self.size = size;
        Ok(()).wrap_with_cost(cost)
    }
}

impl<H: TreeHasher> MerkleTree<H> {
    /// Link `new_root` in place of the current root and return the changes
    /// accumulated in `ws`.
    pub(crate) fn link_root<S: TreeStore>(
        &self,
        mut ws: WorkingSet<'_, S>,
        new_root: Hash,
    ) -> CostResult<TreeBatch, MerkleTreeError> {
        let mut cost = OperationCost::default();
        if new_root != self.root {
            cost_return_on_error!(&mut cost, ws.retain(&new_root, self.depth));
            cost_return_on_error!(&mut cost, ws.release(&self.root, self.depth));
            cost_return_on_error!(&mut cost, ws.release_detached());
        }
        Ok(ws.into_batch()).wrap_with_cost(cost)
    }
}

fn load_meta<S: TreeStore>(store: &S, name: &[u8]) -> CostResult<TreeMeta, MerkleTreeError> {
    store
        .get_meta(name)
        .map(|result| -> Result<TreeMeta, MerkleTreeError> {
            match result? {
                Some(bytes) => TreeMeta::decode(&bytes),
                None => Err(MerkleTreeError::TreeNotFound(
                    String::from_utf8_lossy(name).into_owned(),
                )),
            }
        })
}

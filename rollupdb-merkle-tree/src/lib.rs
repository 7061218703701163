//! Persistent content-addressed Merkle trees for rollup state.
//!
//! A [`MerkleTree`] has a fixed depth between 1 and [`MAX_DEPTH`] and keeps
//! its nodes in a [`TreeStore`], keyed by their own hash. Three node
//! representations coexist:
//!
//! - **Pair** nodes: `left || right`, 64 bytes;
//! - **Packed** subtrees: every non-root layer of a subtree written in bulk
//!   by [`MerkleTree::put_range`], stored as one value;
//! - **Implicit zero** subtrees: never stored, their hashes come from the
//!   tree's [`ZeroHashes`] ladder.
//!
//! Writes ([`MerkleTree::put`], [`MerkleTree::put_range`]) commit node
//! changes and the tree's 40-byte metadata record atomically. Reads
//! ([`MerkleTree::get_hash_path`]) never modify the store.
//!
//! # Store traits
//!
//! - [`TreeStore`]: node, reference count and metadata access
//! - [`OverlayStore`]: in-memory changes over a read-only store
//! - [`TreeStorageContext`]: adapter over a rollupdb `StorageContext`
//!   (feature `storage`)

#![warn(missing_docs)]

pub mod codec;
mod config;
mod error;
mod hash_path;
mod hasher;
mod meta;
mod node;
mod overlay;
mod shared;
mod store;
mod tree;
mod working_set;
mod zero_hashes;

#[cfg(feature = "storage")]
mod storage_adapter;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::MerkleTreeConfig;
pub use error::MerkleTreeError;
pub use hash_path::HashPath;
pub use hasher::{Blake3Hasher, TreeHasher};
pub use meta::{META_SIZE, TreeMeta};
pub use overlay::OverlayStore;
pub use rollupdb_costs::{CostResult, CostsExt, OperationCost};
pub use shared::SharedTree;
#[cfg(feature = "storage")]
pub use storage_adapter::TreeStorageContext;
pub use store::{TreeBatch, TreeStore};
pub use tree::{MerkleTree, SimulatedAdditions};
pub use zero_hashes::{ZeroHashes, validate_depth};

/// A 32-byte node or leaf hash.
pub type Hash = [u8; HASH_SIZE];

/// Length of every hash.
pub const HASH_SIZE: usize = 32;

/// Deepest supported tree.
pub const MAX_DEPTH: u32 = 32;

/// Length of the canonical empty leaf.
pub const LEAF_BYTES: usize = 64;

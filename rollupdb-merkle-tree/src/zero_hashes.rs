use crate::{Hash, MAX_DEPTH, MerkleTreeError, hasher::TreeHasher};

/// Check that `depth` is between 1 and [`MAX_DEPTH`].
pub fn validate_depth(depth: u32) -> Result<(), MerkleTreeError> {
    if !(1..=MAX_DEPTH).contains(&depth) {
        return Err(MerkleTreeError::InvalidDepth(depth));
    }
    Ok(())
}

/// Hashes of all-zero subtrees for every height of a tree.
///
/// Height 0 is the hash of the empty leaf; height `depth` is the root of the
/// empty tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroHashes {
    hashes: Vec<Hash>,
}

impl ZeroHashes {
    /// Compute the ladder for a tree of `depth` levels whose empty leaf is
    /// `empty_leaf_len` zero bytes.
    pub fn new<H: TreeHasher>(
        hasher: &H,
        depth: u32,
        empty_leaf_len: usize,
    ) -> Result<Self, MerkleTreeError> {
        validate_depth(depth)?;
        let mut hashes = Vec::with_capacity(depth as usize + 1);
        let mut current = hasher.hash_leaf(&vec![0u8; empty_leaf_len]);
        hashes.push(current);
        for _ in 0..depth {
            current = hasher.compress(&current, &current);
            hashes.push(current);
        }
        Ok(ZeroHashes { hashes })
    }

    /// Number of levels below the root.
    pub fn depth(&self) -> u32 {
        (self.hashes.len() - 1) as u32
    }

    /// Hash of an all-zero subtree of the given height, `0..=depth`.
    pub fn at(&self, height: u32) -> &Hash {
        &self.hashes[height as usize]
    }

    /// The ladder proper: zero hashes for heights `0..depth`.
    pub fn ladder(&self) -> &[Hash] {
        &self.hashes[..self.hashes.len() - 1]
    }

    /// Root of the empty tree.
    pub fn empty_root(&self) -> Hash {
        self.hashes[self.hashes.len() - 1]
    }
}

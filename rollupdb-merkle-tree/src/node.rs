//! Stored node representations.
//!
//! Nodes are content-addressed: the key of a stored node is its hash. The
//! length of the stored bytes tells the representations apart:
//! - 64 bytes: a pair node, `left || right`;
//! - longer: a packed subtree, every layer of a complete subtree except its
//!   root, leaf layer first.
//!
//! Subtrees whose hash is on the zero ladder are never stored.

use crate::{HASH_SIZE, Hash, MerkleTreeError};

/// Length of a stored pair node.
pub(crate) const PAIR_SIZE: usize = 2 * HASH_SIZE;

/// A node loaded from the store, resolved against the zero ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    ImplicitZero,
    Pair { left: Hash, right: Hash },
    Packed(PackedSubtree),
}

impl Node {
    /// Interpret bytes stored for a node at `height`.
    pub(crate) fn decode(bytes: Vec<u8>, height: u32) -> Result<Self, MerkleTreeError> {
        match bytes.len() {
            PAIR_SIZE => {
                let (left, right) = split_pair(&bytes);
                Ok(Node::Pair { left, right })
            }
            len if len > PAIR_SIZE => {
                let packed = PackedSubtree::from_bytes(bytes)?;
                if packed.height() != height {
                    return Err(MerkleTreeError::CorruptedData(format!(
                        "packed subtree of height {} found at height {height}",
                        packed.height()
                    )));
                }
                Ok(Node::Packed(packed))
            }
            len => Err(MerkleTreeError::CorruptedData(format!(
                "stored node of {len} bytes"
            ))),
        }
    }
}

pub(crate) fn pair_bytes(left: &Hash, right: &Hash) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(PAIR_SIZE);
    bytes.extend_from_slice(left);
    bytes.extend_from_slice(right);
    bytes
}

/// Split 64 pair bytes into the two child hashes.
pub(crate) fn split_pair(bytes: &[u8]) -> (Hash, Hash) {
    let mut left = [0u8; HASH_SIZE];
    let mut right = [0u8; HASH_SIZE];
    left.copy_from_slice(&bytes[..HASH_SIZE]);
    right.copy_from_slice(&bytes[HASH_SIZE..PAIR_SIZE]);
    (left, right)
}

/// Every non-root layer of a complete subtree of height `height >= 2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PackedSubtree {
    height: u32,
    data: Vec<u8>,
}

impl PackedSubtree {
    /// Stored length for a subtree of `height`: `(2^(height+1) - 2)` hashes.
    pub(crate) fn blob_len(height: u32) -> usize {
        HASH_SIZE * ((1usize << (height + 1)) - 2)
    }

    /// Split the output of `hash_tree_from_values` into the root and the
    /// bytes stored under it.
    pub(crate) fn blob_from_layers(layers: &[Hash]) -> (Hash, Vec<u8>) {
        let (root, rest) = match layers.split_last() {
            Some((root, rest)) => (*root, rest),
            None => return ([0u8; HASH_SIZE], Vec::new()),
        };
        (root, rest.concat())
    }

    pub(crate) fn from_bytes(data: Vec<u8>) -> Result<Self, MerkleTreeError> {
        let hashes = data.len() / HASH_SIZE;
        let valid_shape = data.len() % HASH_SIZE == 0 && (hashes + 2).is_power_of_two();
        let height = (hashes + 2).trailing_zeros().saturating_sub(1);
        if !valid_shape || height < 2 {
            return Err(MerkleTreeError::CorruptedData(format!(
                "{} bytes is not a packed subtree",
                data.len()
            )));
        }
        Ok(PackedSubtree { height, data })
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    /// Byte offset where `layer` starts; layer 0 holds the leaves.
    fn layer_offset(&self, layer: u32) -> usize {
        HASH_SIZE * ((1usize << (self.height + 1)) - (1usize << (self.height + 1 - layer)))
    }

    /// Hash at `position` within `layer`, for `layer < height`.
    pub(crate) fn hash_at(&self, layer: u32, position: u64) -> Hash {
        let offset = self.layer_offset(layer) + position as usize * HASH_SIZE;
        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&self.data[offset..offset + HASH_SIZE]);
        hash
    }

    /// The two children of the subtree root.
    pub(crate) fn top_children(&self) -> (Hash, Hash) {
        (
            self.hash_at(self.height - 1, 0),
            self.hash_at(self.height - 1, 1),
        )
    }

    /// Sibling pairs from the leaf layer up to the root's children for the
    /// leaf at `index`, relative to this subtree.
    pub(crate) fn sibling_pairs(&self, index: u64) -> Vec<(Hash, Hash)> {
        (0..self.height)
            .map(|layer| {
                let left = (index >> layer) & !1;
                (self.hash_at(layer, left), self.hash_at(layer, left + 1))
            })
            .collect()
    }

    /// Stored bytes of the two child subtrees, each of height `height - 1`.
    ///
    /// Children of height 1 come out as 64-byte pair nodes.
    pub(crate) fn split(&self) -> (Vec<u8>, Vec<u8>) {
        let child_len = Self::blob_len(self.height - 1);
        let mut left = Vec::with_capacity(child_len);
        let mut right = Vec::with_capacity(child_len);
        for layer in 0..self.height - 1 {
            let start = self.layer_offset(layer);
            let half = HASH_SIZE << (self.height - 1 - layer);
            left.extend_from_slice(&self.data[start..start + half]);
            right.extend_from_slice(&self.data[start + half..start + 2 * half]);
        }
        (left, right)
    }
}

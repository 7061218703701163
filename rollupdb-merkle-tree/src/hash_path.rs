use crate::{
    HASH_SIZE, Hash, MerkleTreeError,
    codec::{deserialize_array_from_vector, serialize_buffer_array_to_vector},
    hasher::TreeHasher,
};

const PAIR_LEN: usize = 2 * HASH_SIZE;

/// Sibling pairs from a leaf up to the root.
///
/// Entry `i` holds the two children of the node at height `i + 1` on the path,
/// so entry 0 is the leaf pair and the last entry the pair right below the
/// root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashPath {
    pairs: Vec<(Hash, Hash)>,
}

impl HashPath {
    /// Build a path from leaf-to-root pairs.
    pub fn new(pairs: Vec<(Hash, Hash)>) -> Self {
        HashPath { pairs }
    }

    /// Leaf-to-root pairs.
    pub fn pairs(&self) -> &[(Hash, Hash)] {
        &self.pairs
    }

    /// Consume the path into its pairs.
    pub fn into_pairs(self) -> Vec<(Hash, Hash)> {
        self.pairs
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// `true` for a path with no levels.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode as a length-prefixed vector of `left || right` elements.
    pub fn encode(&self) -> Vec<u8> {
        let elements: Vec<[u8; PAIR_LEN]> = self
            .pairs
            .iter()
            .map(|(left, right)| {
                let mut element = [0u8; PAIR_LEN];
                element[..HASH_SIZE].copy_from_slice(left);
                element[HASH_SIZE..].copy_from_slice(right);
                element
            })
            .collect();
        serialize_buffer_array_to_vector(&elements)
    }

    /// Decode a path from the start of `buf`, returning it with the number of
    /// bytes consumed so further values can be read after it.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), MerkleTreeError> {
        let (pairs, consumed) = deserialize_array_from_vector(buf, PAIR_LEN, |element| {
            let mut left = [0u8; HASH_SIZE];
            let mut right = [0u8; HASH_SIZE];
            left.copy_from_slice(&element[..HASH_SIZE]);
            right.copy_from_slice(&element[HASH_SIZE..]);
            (left, right)
        })?;
        Ok((HashPath { pairs }, consumed))
    }

    /// Fold the path from `leaf_hash` at `index` up to the root it commits to.
    ///
    /// Returns `None` if some level does not contain the running hash on the
    /// side selected by `index`.
    pub fn root_from_leaf<H: TreeHasher>(
        &self,
        hasher: &H,
        index: u64,
        leaf_hash: Hash,
    ) -> Option<Hash> {
        let mut current = leaf_hash;
        for (level, (left, right)) in self.pairs.iter().enumerate() {
            let on_right = (index >> level) & 1 == 1;
            let expected = if on_right { right } else { left };
            if *expected != current {
                return None;
            }
            current = hasher.compress(left, right);
        }
        Some(current)
    }
}

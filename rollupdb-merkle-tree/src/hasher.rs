//! Hashing capability injected into trees.
//!
//! Domain separation of the default hasher:
//! - Leaves:     `blake3(0x00 || value)`
//! - Pair nodes: `blake3(0x01 || left || right)`

use crate::Hash;

const LEAF_TAG: u8 = 0x00;
const NODE_TAG: u8 = 0x01;

/// Leaf hashing and two-to-one compression used to build a tree.
pub trait TreeHasher {
    /// Hash an arbitrary leaf value.
    fn hash_leaf(&self, value: &[u8]) -> Hash;

    /// Hash two child hashes into their parent.
    fn compress(&self, left: &Hash, right: &Hash) -> Hash;

    /// Hash a power-of-two number of values into a complete subtree.
    ///
    /// Returns every layer bottom-up: the leaf hashes first, then each parent
    /// layer, ending with the root. `values.len()` must be a power of two.
    fn hash_tree_from_values<V: AsRef<[u8]>>(&self, values: &[V]) -> Vec<Hash> {
        debug_assert!(values.len().is_power_of_two());
        let mut hashes: Vec<Hash> = Vec::with_capacity(values.len() * 2 - 1);
        hashes.extend(values.iter().map(|v| self.hash_leaf(v.as_ref())));

        let mut layer_start = 0;
        let mut layer_len = values.len();
        while layer_len > 1 {
            for i in (layer_start..layer_start + layer_len).step_by(2) {
                let parent = self.compress(&hashes[i], &hashes[i + 1]);
                hashes.push(parent);
            }
            layer_start += layer_len;
            layer_len /= 2;
        }
        hashes
    }
}

/// Blake3 with leaf/node domain tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl TreeHasher for Blake3Hasher {
    fn hash_leaf(&self, value: &[u8]) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[LEAF_TAG]);
        hasher.update(value);
        *hasher.finalize().as_bytes()
    }

    fn compress(&self, left: &Hash, right: &Hash) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[NODE_TAG]);
        hasher.update(left);
        hasher.update(right);
        *hasher.finalize().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_and_node_domains_differ() {
        let h = Blake3Hasher;
        let left = [1u8; 32];
        let right = [2u8; 32];
        let mut concatenated = left.to_vec();
        concatenated.extend_from_slice(&right);
        assert_ne!(h.hash_leaf(&concatenated), h.compress(&left, &right));
    }

    #[test]
    fn hash_tree_from_values_layers() {
        let h = Blake3Hasher;
        let values: Vec<Vec<u8>> = (0u8..4).map(|i| vec![i; 8]).collect();
        let hashes = h.hash_tree_from_values(&values);
        assert_eq!(hashes.len(), 7);

        let leaves: Vec<Hash> = values.iter().map(|v| h.hash_leaf(v)).collect();
        assert_eq!(&hashes[..4], &leaves[..]);
        assert_eq!(hashes[4], h.compress(&leaves[0], &leaves[1]));
        assert_eq!(hashes[5], h.compress(&leaves[2], &leaves[3]));
        assert_eq!(hashes[6], h.compress(&hashes[4], &hashes[5]));
    }

    #[test]
    fn single_value_tree_is_its_leaf() {
        let h = Blake3Hasher;
        let hashes = h.hash_tree_from_values(&[b"only"]);
        assert_eq!(hashes, vec![h.hash_leaf(b"only")]);
    }
}

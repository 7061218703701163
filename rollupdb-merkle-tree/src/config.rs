use crate::{LEAF_BYTES, MAX_DEPTH, MerkleTreeError, zero_hashes::validate_depth};

/// Construction parameters of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MerkleTreeConfig {
    /// Number of levels below the root, between 1 and [`MAX_DEPTH`].
    pub depth: u32,
    /// Length of the all-zero buffer whose leaf hash is the empty leaf.
    pub empty_leaf_len: usize,
}

impl Default for MerkleTreeConfig {
    fn default() -> Self {
        MerkleTreeConfig {
            depth: MAX_DEPTH,
            empty_leaf_len: LEAF_BYTES,
        }
    }
}

impl MerkleTreeConfig {
    /// Default configuration with the given depth.
    pub fn with_depth(depth: u32) -> Self {
        MerkleTreeConfig {
            depth,
            ..Default::default()
        }
    }

    /// Check the configuration can be used to build a tree.
    pub fn validate(&self) -> Result<(), MerkleTreeError> {
        validate_depth(self.depth)?;
        if self.empty_leaf_len == 0 {
            return Err(MerkleTreeError::InvalidInput(
                "empty leaf length must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

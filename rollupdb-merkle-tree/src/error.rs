use thiserror::Error;

use crate::MAX_DEPTH;

/// Errors from Merkle tree operations.
#[derive(Debug, Error)]
pub enum MerkleTreeError {
    #[error("invalid tree depth {0}: must be between 1 and {MAX_DEPTH}")]
    InvalidDepth(u32),
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),
    #[error("subtree of height {height} at index {index} conflicts with an existing packed subtree")]
    SubtreeConflict { index: u64, height: u32 },
    #[error("index {index} out of range (capacity {capacity})")]
    IndexOutOfRange { index: u64, capacity: u64 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("corrupted data: {0}")]
    CorruptedData(String),
    #[error("tree not found: {0}")]
    TreeNotFound(String),
    #[error("store error: {0}")]
    StoreError(String),
}

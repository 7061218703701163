use byteorder::{ByteOrder, LittleEndian};

use crate::{HASH_SIZE, Hash, MerkleTreeError};

/// Size of the persisted metadata record.
pub const META_SIZE: usize = 40;

/// Persisted state of a named tree: `root (32) || depth (u32 LE) || size (u32 LE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeMeta {
    /// Current root hash.
    pub root: Hash,
    /// Number of levels below the root.
    pub depth: u32,
    /// Highest written index plus one.
    pub size: u32,
}

impl TreeMeta {
    /// Serialize to the 40-byte record.
    pub fn encode(&self) -> [u8; META_SIZE] {
        let mut buf = [0u8; META_SIZE];
        buf[..HASH_SIZE].copy_from_slice(&self.root);
        LittleEndian::write_u32(&mut buf[HASH_SIZE..HASH_SIZE + 4], self.depth);
        LittleEndian::write_u32(&mut buf[HASH_SIZE + 4..], self.size);
        buf
    }

    /// Deserialize from a 40-byte record.
    pub fn decode(bytes: &[u8]) -> Result<Self, MerkleTreeError> {
        if bytes.len() != META_SIZE {
            return Err(MerkleTreeError::CorruptedData(format!(
                "tree metadata must be {META_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut root = [0u8; HASH_SIZE];
        root.copy_from_slice(&bytes[..HASH_SIZE]);
        Ok(TreeMeta {
            root,
            depth: LittleEndian::read_u32(&bytes[HASH_SIZE..HASH_SIZE + 4]),
            size: LittleEndian::read_u32(&bytes[HASH_SIZE + 4..]),
        })
    }
}

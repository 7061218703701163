//! Storage adapter bridging rollupdb's `StorageContext` to `TreeStore`.
//!
//! Nodes live in the main key space keyed by their hash, reference counts in
//! the auxiliary key space under the same hash (`u32` little-endian), and
//! tree metadata in the metadata key space keyed by tree name.

use byteorder::{ByteOrder, LittleEndian};
use rollupdb_costs::{CostResult, CostsExt, OperationCost};
use rollupdb_storage::{StorageBatch, StorageContext};

use crate::{Hash, MerkleTreeError, TreeBatch, TreeStore};

/// Storage adapter wrapping a rollupdb `StorageContext` for Merkle trees.
pub struct TreeStorageContext<'a, C> {
    ctx: &'a C,
}

impl<'a, C> TreeStorageContext<'a, C> {
    /// Create a new storage context adapter.
    pub fn new(ctx: &'a C) -> Self {
        Self { ctx }
    }
}

fn store_error(what: &str, key: &[u8], e: rollupdb_storage::Error) -> MerkleTreeError {
    MerkleTreeError::StoreError(format!("{what} {}: {e}", hex::encode(key)))
}

impl<C: StorageContext> TreeStore for TreeStorageContext<'_, C> {
    fn get_node(&self, key: &Hash) -> CostResult<Option<Vec<u8>>, MerkleTreeError> {
        self.ctx
            .get(key)
            .map_err(|e| store_error("get node", key, e))
    }

    fn get_ref_count(&self, key: &Hash) -> CostResult<u32, MerkleTreeError> {
        self.ctx
            .get_aux(key)
            .map_err(|e| store_error("get ref count", key, e))
            .map(|result| -> Result<u32, MerkleTreeError> {
                match result? {
                    None => Ok(0),
                    Some(bytes) if bytes.len() == 4 => Ok(LittleEndian::read_u32(&bytes)),
                    Some(bytes) => Err(MerkleTreeError::CorruptedData(format!(
                        "ref count of {} has {} bytes",
                        hex::encode(key),
                        bytes.len()
                    ))),
                }
            })
    }

    fn get_meta(&self, name: &[u8]) -> CostResult<Option<Vec<u8>>, MerkleTreeError> {
        self.ctx
            .get_meta(name)
            .map_err(|e| store_error("get meta", name, e))
    }

    fn commit(&self, batch: TreeBatch) -> CostResult<(), MerkleTreeError> {
        if batch.is_empty() {
            return Ok(()).wrap_with_cost(OperationCost::default());
        }
        let mut storage_batch = StorageBatch::new();
        for (key, value) in batch.nodes {
            match value {
                Some(bytes) => storage_batch.put(key.to_vec(), bytes),
                None => storage_batch.delete(key.to_vec()),
            }
        }
        for (key, count) in batch.ref_counts {
            if count == 0 {
                storage_batch.delete_aux(key.to_vec());
            } else {
                storage_batch.put_aux(key.to_vec(), count.to_le_bytes().to_vec());
            }
        }
        for (name, record) in batch.meta {
            storage_batch.put_meta(name, record);
        }
        self.ctx
            .commit_batch(storage_batch)
            .map_err(|e| MerkleTreeError::StoreError(format!("commit batch: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use rollupdb_storage::{Column, MemoryStorage};

    use super::*;

    #[test]
    fn test_commit_maps_key_spaces() {
        let storage = MemoryStorage::new();
        let store = TreeStorageContext::new(&storage);

        let mut batch = TreeBatch::default();
        batch.nodes.insert([1; 32], Some(vec![9; 64]));
        batch.ref_counts.insert([1; 32], 3);
        batch.meta.insert(b"tree".to_vec(), vec![0; 40]);
        store.commit(batch).unwrap().expect("commit");

        assert_eq!(storage.len(Column::Data), 1);
        assert_eq!(
            storage.get_aux([1u8; 32]).unwrap().expect("aux"),
            Some(vec![3, 0, 0, 0])
        );
        assert_eq!(store.get_ref_count(&[1; 32]).unwrap().expect("count"), 3);
        assert_eq!(
            store.get_node(&[1; 32]).unwrap().expect("node"),
            Some(vec![9; 64])
        );
        assert_eq!(
            store.get_meta(b"tree").unwrap().expect("meta"),
            Some(vec![0; 40])
        );

        let mut batch = TreeBatch::default();
        batch.nodes.insert([1; 32], None);
        batch.ref_counts.insert([1; 32], 0);
        store.commit(batch).unwrap().expect("commit");
        assert!(storage.is_empty(Column::Data));
        assert!(storage.is_empty(Column::Aux));
        assert_eq!(store.get_ref_count(&[1; 32]).unwrap().expect("count"), 0);
    }

    #[test]
    fn test_malformed_ref_count() {
        let storage = MemoryStorage::new();
        let mut batch = StorageBatch::new();
        batch.put_aux(vec![2; 32], vec![1, 2]);
        storage.commit_batch(batch).unwrap().expect("commit");

        let store = TreeStorageContext::new(&storage);
        assert!(matches!(
            store.get_ref_count(&[2; 32]).unwrap(),
            Err(MerkleTreeError::CorruptedData(_))
        ));
    }
}

// MIT LICENSE
//
// Copyright (c) 2021 Dash Core Group
//
// Permission is hereby granted, free of charge, to any
// person obtaining a copy of this software and associated
// documentation files (the "Software"), to deal in the
// Software without restriction, including without
// limitation the rights to use, copy, modify, merge,
// publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software
// is furnished to do so, subject to the following
// conditions:
//
// The above copyright notice and this permission notice
// shall be included in all copies or substantial portions
// of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF
// ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED
// TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A
// PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT
// SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY
// CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR
// IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! Storage context trait and deferred batches

use std::collections::{BTreeMap, btree_map::IntoValues};

use rollupdb_costs::{CostResult, CostsExt, OperationCost};

use crate::Error;

/// Key space a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum::AsRefStr)]
pub enum Column {
    /// Main key space
    Data,
    /// Auxiliary key space
    Aux,
    /// Metadata key space
    Meta,
}

/// Read access to storage plus atomic application of batches.
///
/// Missing keys are reported as `Ok(None)`, never as an error.
pub trait StorageContext {
    /// Get a value from the main key space.
    fn get<K: AsRef<[u8]>>(&self, key: K) -> CostResult<Option<Vec<u8>>, Error> {
        self.get_from(Column::Data, key.as_ref())
    }

    /// Get a value from the auxiliary key space.
    fn get_aux<K: AsRef<[u8]>>(&self, key: K) -> CostResult<Option<Vec<u8>>, Error> {
        self.get_from(Column::Aux, key.as_ref())
    }

    /// Get a value from the metadata key space.
    fn get_meta<K: AsRef<[u8]>>(&self, key: K) -> CostResult<Option<Vec<u8>>, Error> {
        self.get_from(Column::Meta, key.as_ref())
    }

    /// Get a value from the given key space.
    fn get_from(&self, column: Column, key: &[u8]) -> CostResult<Option<Vec<u8>>, Error>;

    /// Put a value into the main key space immediately.
    fn put<K: AsRef<[u8]>>(&self, key: K, value: &[u8]) -> CostResult<(), Error> {
        let mut batch = StorageBatch::new();
        batch.put(key.as_ref().to_vec(), value.to_vec());
        self.commit_batch(batch)
    }

    /// Delete a value from the main key space immediately.
    fn delete<K: AsRef<[u8]>>(&self, key: K) -> CostResult<(), Error> {
        let mut batch = StorageBatch::new();
        batch.delete(key.as_ref().to_vec());
        self.commit_batch(batch)
    }

    /// Apply every operation of `batch` atomically: either all of them are
    /// visible afterwards or none is.
    fn commit_batch(&self, batch: StorageBatch) -> CostResult<(), Error>;
}

/// Deferred storage operation.
#[derive(strum::AsRefStr)]
pub enum BatchOperation {
    /// Deferred put operation
    Put {
        /// Target key space
        column: Column,
        /// Key
        key: Vec<u8>,
        /// Value
        value: Vec<u8>,
    },
    /// Deferred delete operation
    Delete {
        /// Target key space
        column: Column,
        /// Key
        key: Vec<u8>,
    },
}

impl BatchOperation {
    /// Key space this operation targets.
    pub fn column(&self) -> Column {
        match self {
            BatchOperation::Put { column, .. } | BatchOperation::Delete { column, .. } => *column,
        }
    }

    /// Key this operation targets.
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOperation::Put { key, .. } | BatchOperation::Delete { key, .. } => key,
        }
    }
}

impl std::fmt::Debug for BatchOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fmt = f.debug_struct(self.as_ref());
        fmt.field("column", &self.column().as_ref());
        fmt.field("key", &hex::encode(self.key()));
        if let BatchOperation::Put { value, .. } = self {
            fmt.field("value", &hex::encode(value));
        }
        fmt.finish()
    }
}

/// Batch of deferred operations across the three key spaces.
///
/// A later `put` replaces an earlier operation on the same key; a `delete`
/// never overrides an operation already recorded for its key.
#[derive(Default)]
pub struct StorageBatch {
    data: BTreeMap<Vec<u8>, BatchOperation>,
    aux: BTreeMap<Vec<u8>, BatchOperation>,
    meta: BTreeMap<Vec<u8>, BatchOperation>,
}

impl std::fmt::Debug for StorageBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fmt = f.debug_struct("StorageBatch");

        fmt.field("data", &self.data.values());
        fmt.field("aux", &self.aux.values());
        fmt.field("meta", &self.meta.values());

        fmt.finish()
    }
}

impl StorageBatch {
    /// Create empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get batch length
    pub fn len(&self) -> usize {
        self.data.len() + self.aux.len() + self.meta.len()
    }

    /// Batch emptiness predicate
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn column_mut(&mut self, column: Column) -> &mut BTreeMap<Vec<u8>, BatchOperation> {
        match column {
            Column::Data => &mut self.data,
            Column::Aux => &mut self.aux,
            Column::Meta => &mut self.meta,
        }
    }

    /// Add deferred `put` operation to the given key space
    pub fn put_in(&mut self, column: Column, key: Vec<u8>, value: Vec<u8>) {
        self.column_mut(column)
            .insert(key.clone(), BatchOperation::Put { column, key, value });
    }

    /// Add deferred `delete` operation to the given key space
    pub fn delete_in(&mut self, column: Column, key: Vec<u8>) {
        let operations = self.column_mut(column);
        if !operations.contains_key(&key) {
            operations.insert(key.clone(), BatchOperation::Delete { column, key });
        }
    }

    /// Add deferred `put` operation
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.put_in(Column::Data, key, value)
    }

    /// Add deferred `put` operation for aux storage
    pub fn put_aux(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.put_in(Column::Aux, key, value)
    }

    /// Add deferred `put` operation for metadata storage
    pub fn put_meta(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.put_in(Column::Meta, key, value)
    }

    /// Add deferred `delete` operation
    pub fn delete(&mut self, key: Vec<u8>) {
        self.delete_in(Column::Data, key)
    }

    /// Add deferred `delete` operation for aux storage
    pub fn delete_aux(&mut self, key: Vec<u8>) {
        self.delete_in(Column::Aux, key)
    }

    /// Add deferred `delete` operation for metadata storage
    pub fn delete_meta(&mut self, key: Vec<u8>) {
        self.delete_in(Column::Meta, key)
    }

    /// Cost of applying this batch: bytes written by puts (key and value)
    /// and key bytes freed by deletes.
    pub fn cost(&self) -> OperationCost {
        let mut cost = OperationCost::default();
        for op in self.data.values().chain(self.aux.values()).chain(self.meta.values()) {
            match op {
                BatchOperation::Put { key, value, .. } => {
                    cost.storage_written_bytes += (key.len() + value.len()) as u64
                }
                BatchOperation::Delete { key, .. } => cost.storage_freed_bytes += key.len() as u64,
            }
        }
        cost
    }

    /// Consume the batch, yielding metadata operations first, then auxiliary,
    /// then main key space operations.
    pub fn into_operations(self) -> StorageBatchIter {
        StorageBatchIter {
            data: self.data.into_values(),
            aux: self.aux.into_values(),
            meta: self.meta.into_values(),
        }
    }
}

/// Iterator over storage batch operations.
pub struct StorageBatchIter {
    data: IntoValues<Vec<u8>, BatchOperation>,
    aux: IntoValues<Vec<u8>, BatchOperation>,
    meta: IntoValues<Vec<u8>, BatchOperation>,
}

impl Iterator for StorageBatchIter {
    type Item = BatchOperation;

    fn next(&mut self) -> Option<Self::Item> {
        self.meta
            .next()
            .or_else(|| self.aux.next())
            .or_else(|| self.data.next())
    }
}

/// Wraps a lookup result with the cost of one seek plus the loaded bytes.
pub(crate) fn lookup_result(value: Option<Vec<u8>>) -> CostResult<Option<Vec<u8>>, Error> {
    let loaded = value.as_ref().map(Vec::len).unwrap_or_default();
    Ok(value).wrap_with_cost(OperationCost::lookup(loaded))
}

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

//! In-memory storage backend

use std::collections::BTreeMap;

use parking_lot::RwLock;
use rollupdb_costs::{CostResult, CostsExt};

use crate::{
    Error,
    storage::{BatchOperation, Column, StorageBatch, StorageContext, lookup_result},
};

#[derive(Default)]
struct Columns {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    aux: BTreeMap<Vec<u8>, Vec<u8>>,
    meta: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Columns {
    fn column(&self, column: Column) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        match column {
            Column::Data => &self.data,
            Column::Aux => &self.aux,
            Column::Meta => &self.meta,
        }
    }

    fn column_mut(&mut self, column: Column) -> &mut BTreeMap<Vec<u8>, Vec<u8>> {
        match column {
            Column::Data => &mut self.data,
            Column::Aux => &mut self.aux,
            Column::Meta => &mut self.meta,
        }
    }
}

/// Storage kept entirely in memory.
///
/// Batches are applied under a single write lock, so readers on other threads
/// observe either none or all of a batch.
#[derive(Default)]
pub struct MemoryStorage {
    columns: RwLock<Columns>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys stored in the given key space.
    pub fn len(&self, column: Column) -> usize {
        self.columns.read().column(column).len()
    }

    /// `true` if the given key space holds no keys.
    pub fn is_empty(&self, column: Column) -> bool {
        self.len(column) == 0
    }

    /// Snapshot of every key stored in the given key space.
    pub fn keys(&self, column: Column) -> Vec<Vec<u8>> {
        self.columns.read().column(column).keys().cloned().collect()
    }
}

impl StorageContext for MemoryStorage {
    fn get_from(&self, column: Column, key: &[u8]) -> CostResult<Option<Vec<u8>>, Error> {
        let value = self.columns.read().column(column).get(key).cloned();
        lookup_result(value)
    }

    fn commit_batch(&self, batch: StorageBatch) -> CostResult<(), Error> {
        let cost = batch.cost();
        let mut columns = self.columns.write();
        for op in batch.into_operations() {
            match op {
                BatchOperation::Put { column, key, value } => {
                    columns.column_mut(column).insert(key, value);
                }
                BatchOperation::Delete { column, key } => {
                    columns.column_mut(column).remove(&key);
                }
            }
        }
        Ok(()).wrap_with_cost(cost)
    }
}

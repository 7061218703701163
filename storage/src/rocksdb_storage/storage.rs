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

//! Storage context over a RocksDB database

use std::path::Path;

use rocksdb::{ColumnFamily, DB, WriteBatch};
use rollupdb_costs::{CostResult, CostsExt, OperationCost};

use super::{AUX_CF_NAME, META_CF_NAME, column_families, default_db_opts};
use crate::{
    Error,
    storage::{BatchOperation, Column, StorageBatch, StorageContext, lookup_result},
};

/// Storage backed by a RocksDB database.
///
/// The main key space is the default column family; auxiliary and metadata
/// key spaces are the `aux` and `meta` column families.
pub struct RocksDbStorage {
    db: DB,
}

impl RocksDbStorage {
    /// Open (creating if needed) a database at `path` with default options.
    pub fn default_rocksdb_with_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let db = DB::open_cf_descriptors(&default_db_opts(), path, column_families())?;
        Ok(RocksDbStorage { db })
    }

    /// Flush memtables of every column family to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        for name in [AUX_CF_NAME, META_CF_NAME] {
            self.db.flush_cf(self.cf(name)?)?;
        }
        Ok(())
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily, Error> {
        self.db
            .cf_handle(name)
            .ok_or(Error::MissingColumnFamily(name))
    }

    fn column_cf(&self, column: Column) -> Result<Option<&ColumnFamily>, Error> {
        match column {
            Column::Data => Ok(None),
            Column::Aux => self.cf(AUX_CF_NAME).map(Some),
            Column::Meta => self.cf(META_CF_NAME).map(Some),
        }
    }
}

impl StorageContext for RocksDbStorage {
    fn get_from(&self, column: Column, key: &[u8]) -> CostResult<Option<Vec<u8>>, Error> {
        let value = match self.column_cf(column) {
            Ok(None) => self.db.get(key).map_err(Error::from),
            Ok(Some(cf)) => self.db.get_cf(cf, key).map_err(Error::from),
            Err(e) => Err(e),
        };
        match value {
            Ok(value) => lookup_result(value),
            Err(e) => Err(e).wrap_with_cost(OperationCost::with_seek_count(1)),
        }
    }

    fn commit_batch(&self, batch: StorageBatch) -> CostResult<(), Error> {
        let cost = batch.cost();
        let mut db_batch = WriteBatch::default();
        for op in batch.into_operations() {
            let cf = match self.column_cf(op.column()) {
                Ok(cf) => cf,
                Err(e) => return Err(e).wrap_with_cost(OperationCost::default()),
            };
            match (op, cf) {
                (BatchOperation::Put { key, value, .. }, None) => db_batch.put(key, value),
                (BatchOperation::Put { key, value, .. }, Some(cf)) => {
                    db_batch.put_cf(cf, key, value)
                }
                (BatchOperation::Delete { key, .. }, None) => db_batch.delete(key),
                (BatchOperation::Delete { key, .. }, Some(cf)) => db_batch.delete_cf(cf, key),
            }
        }
        self.db
            .write(db_batch)
            .map_err(Error::from)
            .wrap_with_cost(cost)
    }
}

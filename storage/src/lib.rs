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

//! Storage for rollupdb.
//!
//! Three key spaces live side by side in every backend: `data` for
//! content-addressed nodes, `aux` for bookkeeping such as reference counts and
//! `meta` for small named records. Writes are grouped into a [`StorageBatch`]
//! and applied atomically by [`StorageContext::commit_batch`].

#![deny(missing_docs)]

mod error;
mod memory_storage;
#[cfg(feature = "rocksdb_storage")]
pub mod rocksdb_storage;
mod storage;

pub use crate::{
    error::Error,
    memory_storage::MemoryStorage,
    storage::{BatchOperation, Column, StorageBatch, StorageBatchIter, StorageContext},
};

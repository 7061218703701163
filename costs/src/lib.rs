#![deny(missing_docs)]
//! Cost accounting shared by the rollupdb storage layer and tree engine.
//!
//! Every storage access and every tree operation reports what it touched as an
//! [`OperationCost`], carried next to the result in a [`CostContext`]. Callers
//! accumulate costs with [`CostContext::unwrap_add_cost`] or the
//! [`cost_return_on_error!`] family of macros.

mod context;

use std::ops::{Add, AddAssign};

pub use context::{CostContext, CostResult, CostsExt};

/// Approximation of the resources an operation consumed.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct OperationCost {
    /// How many storage lookups were done.
    pub seek_count: u32,
    /// How many bytes were written to storage.
    pub storage_written_bytes: u64,
    /// How many bytes were loaded from storage.
    pub storage_loaded_bytes: u64,
    /// How many bytes were removed from storage.
    pub storage_freed_bytes: u64,
    /// How many leaf or node hashes were computed.
    pub hash_node_calls: u32,
}

impl OperationCost {
    /// Cost of `seek_count` lookups and nothing else.
    pub fn with_seek_count(seek_count: u32) -> Self {
        OperationCost {
            seek_count,
            ..Default::default()
        }
    }

    /// Cost of computing `hash_node_calls` hashes.
    pub fn with_hash_node_calls(hash_node_calls: u32) -> Self {
        OperationCost {
            hash_node_calls,
            ..Default::default()
        }
    }

    /// Cost of one lookup that returned `loaded_bytes` bytes.
    pub fn lookup(loaded_bytes: usize) -> Self {
        OperationCost {
            seek_count: 1,
            storage_loaded_bytes: loaded_bytes as u64,
            ..Default::default()
        }
    }

    /// `true` if no resources were consumed at all.
    pub fn is_nothing(&self) -> bool {
        *self == OperationCost::default()
    }
}

impl Add for OperationCost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        OperationCost {
            seek_count: self.seek_count + rhs.seek_count,
            storage_written_bytes: self.storage_written_bytes + rhs.storage_written_bytes,
            storage_loaded_bytes: self.storage_loaded_bytes + rhs.storage_loaded_bytes,
            storage_freed_bytes: self.storage_freed_bytes + rhs.storage_freed_bytes,
            hash_node_calls: self.hash_node_calls + rhs.hash_node_calls,
        }
    }
}

impl AddAssign for OperationCost {
    fn add_assign(&mut self, rhs: Self) {
        self.seek_count += rhs.seek_count;
        self.storage_written_bytes += rhs.storage_written_bytes;
        self.storage_loaded_bytes += rhs.storage_loaded_bytes;
        self.storage_freed_bytes += rhs.storage_freed_bytes;
        self.hash_node_calls += rhs.hash_node_calls;
    }
}

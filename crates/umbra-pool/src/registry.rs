//! nullifier registry
//!
//! append-only set of published nullifiers. inserting a value twice is the
//! double-spend signal and is rejected; entries are never removed. the hash
//! set keeps membership O(1) out to tens of millions of entries.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use umbra_core::{FieldBytes, Nullifier};

use crate::error::PoolError;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NullifierRegistry {
    spent: HashSet<FieldBytes>,
}

impl NullifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, nullifier: &Nullifier) -> bool {
        self.spent.contains(&nullifier.to_bytes())
    }

    /// record a spend; a duplicate is rejected and leaves the set unchanged
    pub fn insert(&mut self, nullifier: Nullifier) -> Result<(), PoolError> {
        if !self.spent.insert(nullifier.to_bytes()) {
            return Err(PoolError::DoubleSpend);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}

//! nullifiers
//!
//! spending a note publishes its nullifier; the pool rejects any value seen
//! twice. the derivation binds the tree position rather than the commitment,
//! so the same commitment inserted at two positions yields two nullifiers

use serde::{Deserialize, Serialize};

use crate::field::{fr_from_u64, fr_to_bytes, FieldBytes};
use crate::keys::NullifyingKey;
use crate::poseidon::hash2;

/// deterministic spend marker for a note at a tree position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nullifier(pub FieldBytes);

impl Nullifier {
    pub fn derive(nk: &NullifyingKey, leaf_index: u64) -> Self {
        Self(fr_to_bytes(&hash2(nk.to_field(), fr_from_u64(leaf_index))))
    }

    pub fn to_bytes(&self) -> FieldBytes {
        self.0
    }

    pub fn from_bytes(bytes: FieldBytes) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Nullifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

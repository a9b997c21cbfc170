//! client-side tree reconstruction
//!
//! the scanner rebuilds the commitment tree from events so it can hand the
//! prover sibling paths. commitments must land in emission order; anything
//! arriving early is buffered, and proofs are refused while a position is
//! missing, because a path over a gapped tree would be garbage.

use std::collections::BTreeMap;

use umbra_core::poseidon::hash2_bytes;
use umbra_core::{Commitment, FieldBytes};
use umbra_pool::{zero_hash, TREE_DEPTH};

use crate::error::SyncError;

/// merkle path from a leaf to the root, siblings bottom-up
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerklePath {
    pub position: u64,
    pub siblings: Vec<FieldBytes>,
}

impl MerklePath {
    /// fold the path and compare against a root
    pub fn verify(&self, commitment: &Commitment, root: &FieldBytes) -> bool {
        let mut node = commitment.to_bytes();
        let mut index = self.position;
        for sibling in &self.siblings {
            node = if index & 1 == 0 {
                hash2_bytes(&node, sibling)
            } else {
                hash2_bytes(sibling, &node)
            };
            index >>= 1;
        }
        node == *root
    }
}

/// append-only mirror of a pool's commitment tree
#[derive(Clone, Debug, Default)]
pub struct TreeMirror {
    leaves: Vec<Commitment>,
    /// commitments that arrived ahead of their predecessors
    pending: BTreeMap<u64, Commitment>,
}

impl TreeMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u64 {
        self.leaves.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn leaves(&self) -> &[Commitment] {
        &self.leaves
    }

    /// position of the first missing commitment, if any event arrived early
    pub fn gap(&self) -> Option<u64> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.len())
        }
    }

    /// place a commitment at its emitted position
    ///
    /// re-inserting an already-known position is a no-op as long as the
    /// commitment matches, so overlapping rescans stay idempotent
    pub fn insert_at(&mut self, position: u64, commitment: Commitment) -> Result<(), SyncError> {
        if position >= 1u64 << TREE_DEPTH {
            return Err(SyncError::TreeFull);
        }

        if position < self.len() {
            if self.leaves[position as usize] != commitment {
                return Err(SyncError::CommitmentConflict(position));
            }
            return Ok(());
        }

        if position > self.len() {
            if let Some(existing) = self.pending.get(&position) {
                if *existing != commitment {
                    return Err(SyncError::CommitmentConflict(position));
                }
                return Ok(());
            }
            self.pending.insert(position, commitment);
            return Ok(());
        }

        self.leaves.push(commitment);
        // drain anything that was waiting on this position
        while let Some(next) = self.pending.remove(&self.len()) {
            self.leaves.push(next);
        }
        Ok(())
    }

    /// current root over the reconstructed leaves
    pub fn root(&self) -> FieldBytes {
        if self.leaves.is_empty() {
            return zero_hash(TREE_DEPTH);
        }
        let mut level: Vec<FieldBytes> = self.leaves.iter().map(|c| c.to_bytes()).collect();
        for depth in 0..TREE_DEPTH {
            if level.len() % 2 == 1 {
                level.push(zero_hash(depth));
            }
            level = level
                .chunks(2)
                .map(|pair| hash2_bytes(&pair[0], &pair[1]))
                .collect();
        }
        level[0]
    }

    /// sibling path for a reconstructed leaf
    pub fn prove(&self, position: u64) -> Result<MerklePath, SyncError> {
        if let Some(gap) = self.gap() {
            return Err(SyncError::GapOpen(gap));
        }
        if position >= self.len() {
            return Err(SyncError::UnknownPosition(position));
        }

        let mut level: Vec<FieldBytes> = self.leaves.iter().map(|c| c.to_bytes()).collect();
        let mut index = position as usize;
        let mut siblings = Vec::with_capacity(TREE_DEPTH);

        for depth in 0..TREE_DEPTH {
            let sibling_index = index ^ 1;
            siblings.push(if sibling_index < level.len() {
                level[sibling_index]
            } else {
                zero_hash(depth)
            });

            if level.len() % 2 == 1 {
                level.push(zero_hash(depth));
            }
            level = level
                .chunks(2)
                .map(|pair| hash2_bytes(&pair[0], &pair[1]))
                .collect();
            index >>= 1;
        }

        Ok(MerklePath {
            position,
            siblings,
        })
    }
}

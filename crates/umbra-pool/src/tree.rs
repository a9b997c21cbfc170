//! incremental commitment tree
//!
//! fixed-depth append-only poseidon merkle tree. only the right frontier is
//! kept: one filled-subtree hash per level is enough to fold a new leaf into
//! the root in O(depth). a bounded fifo of recent roots lets provers succeed
//! against a slightly stale snapshot.

use std::collections::VecDeque;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use umbra_core::poseidon::hash2_bytes;
use umbra_core::{Commitment, FieldBytes};

use crate::error::PoolError;

/// protocol tree depth; capacity 2^16 leaves per pool
pub const TREE_DEPTH: usize = 16;

/// how many recent roots stay provable
pub const ROOT_HISTORY: usize = 100;

static ZERO_LADDER: OnceLock<Vec<FieldBytes>> = OnceLock::new();

/// hash of the all-empty subtree at `level`; `zero(0)` is the empty leaf,
/// `zero(TREE_DEPTH)` the root of the empty tree
pub fn zero_hash(level: usize) -> FieldBytes {
    let ladder = ZERO_LADDER.get_or_init(|| {
        let mut ladder = Vec::with_capacity(TREE_DEPTH + 1);
        ladder.push([0u8; 32]);
        for i in 1..=TREE_DEPTH {
            let below = ladder[i - 1];
            ladder.push(hash2_bytes(&below, &below));
        }
        ladder
    });
    ladder[level]
}

/// append-only merkle tree over note commitments
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitmentTree {
    depth: usize,
    next_leaf_index: u64,
    /// rightmost filled subtree hash per level
    frontier: Vec<FieldBytes>,
    root: FieldBytes,
}

impl CommitmentTree {
    pub fn new() -> Self {
        Self::with_depth(TREE_DEPTH)
    }

    /// smaller depths exist only so capacity boundaries stay testable
    pub(crate) fn with_depth(depth: usize) -> Self {
        assert!(depth >= 1 && depth <= TREE_DEPTH);
        Self {
            depth,
            next_leaf_index: 0,
            frontier: (0..depth).map(zero_hash).collect(),
            root: zero_hash(depth),
        }
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn is_full(&self) -> bool {
        self.next_leaf_index >= self.capacity()
    }

    pub fn next_leaf_index(&self) -> u64 {
        self.next_leaf_index
    }

    pub fn root(&self) -> FieldBytes {
        self.root
    }

    /// append a leaf, returning the position it landed at
    pub fn insert(&mut self, leaf: &Commitment) -> Result<u64, PoolError> {
        if self.is_full() {
            return Err(PoolError::TreeFull);
        }

        let position = self.next_leaf_index;
        let mut index = position;
        let mut node = leaf.to_bytes();

        for level in 0..self.depth {
            if index & 1 == 0 {
                // left child: remember it for the sibling to come, pair
                // with the empty subtree on the right
                self.frontier[level] = node;
                node = hash2_bytes(&node, &zero_hash(level));
            } else {
                node = hash2_bytes(&self.frontier[level], &node);
            }
            index >>= 1;
        }

        self.root = node;
        self.next_leaf_index += 1;
        Ok(position)
    }
}

impl Default for CommitmentTree {
    fn default() -> Self {
        Self::new()
    }
}

/// bounded fifo of roots the pool still accepts proofs against
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RootRing {
    roots: VecDeque<FieldBytes>,
    capacity: usize,
}

impl RootRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            roots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// record a root that just became current, evicting the oldest entry
    /// once the window is full
    pub fn push(&mut self, root: FieldBytes) {
        if self.roots.len() == self.capacity {
            self.roots.pop_front();
        }
        self.roots.push_back(root);
    }

    pub fn contains(&self, root: &FieldBytes) -> bool {
        // newest entries are the likeliest match
        self.roots.iter().rev().any(|r| r == root)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

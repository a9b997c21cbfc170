//! pool aggregate
//!
//! one long-lived mutable object per token type: the commitment tree, the
//! accepted-root window, the nullifier registry, the token balance and the
//! three verifying keys. the host serialises all access, so the aggregate
//! needs no internal locking.

use serde::{Deserialize, Serialize};

use umbra_core::{FieldBytes, TokenId};

use crate::error::PoolError;
use crate::registry::NullifierRegistry;
use crate::tree::{CommitmentTree, RootRing, ROOT_HISTORY};

/// host object id of a pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolId(pub [u8; 32]);

/// host object id of an admin capability
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapId(pub [u8; 32]);

const ADMIN_CAP_DOMAIN: &[u8] = b"umbra.admin-cap.v1";

fn mint_cap_id(pool: PoolId) -> CapId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(ADMIN_CAP_DOMAIN);
    hasher.update(&pool.0);
    CapId(*hasher.finalize().as_bytes())
}

/// non-transferable capability authorising verifying-key rotation on the
/// pool it was minted with
#[derive(Debug)]
pub struct AdminCap {
    id: CapId,
    pool: PoolId,
}

impl AdminCap {
    pub fn id(&self) -> CapId {
        self.id
    }

    pub fn pool(&self) -> PoolId {
        self.pool
    }
}

/// the three per-operation verifying keys
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKeys {
    pub unshield: Vec<u8>,
    pub transfer: Vec<u8>,
    pub swap: Vec<u8>,
}

/// shielded pool for a single token type
///
/// everything here is the persisted object state: balance, tree frontier,
/// root window, nullifier set, verifying keys and the minted cap id
#[derive(Debug, Serialize, Deserialize)]
pub struct Pool {
    id: PoolId,
    token: TokenId,
    balance: u64,
    pub(crate) tree: CommitmentTree,
    pub(crate) roots: RootRing,
    pub(crate) nullifiers: NullifierRegistry,
    vks: VerifyingKeys,
    admin_cap: CapId,
}

impl Pool {
    /// create a pool and mint the admin capability bound to it
    pub fn new(id: PoolId, token: TokenId, vks: VerifyingKeys) -> (Self, AdminCap) {
        let tree = CommitmentTree::new();
        let mut roots = RootRing::new(ROOT_HISTORY);
        roots.push(tree.root());
        let cap_id = mint_cap_id(id);

        let pool = Self {
            id,
            token,
            balance: 0,
            tree,
            roots,
            nullifiers: NullifierRegistry::new(),
            vks,
            admin_cap: cap_id,
        };
        let cap = AdminCap { id: cap_id, pool: id };
        (pool, cap)
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn token(&self) -> TokenId {
        self.token
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn current_root(&self) -> FieldBytes {
        self.tree.root()
    }

    pub fn next_leaf_index(&self) -> u64 {
        self.tree.next_leaf_index()
    }

    pub fn nullifier_count(&self) -> usize {
        self.nullifiers.len()
    }

    pub fn admin_cap_id(&self) -> CapId {
        self.admin_cap
    }

    /// a root is provable if it is current or still inside the window
    pub fn is_known_root(&self, root: &FieldBytes) -> bool {
        *root == self.tree.root() || self.roots.contains(root)
    }

    pub fn unshield_vk(&self) -> &[u8] {
        &self.vks.unshield
    }

    pub fn transfer_vk(&self) -> &[u8] {
        &self.vks.transfer
    }

    pub fn swap_vk(&self) -> &[u8] {
        &self.vks.swap
    }

    /// rotation takes effect immediately; proofs generated against the old
    /// key fail from the next transaction on, there is no grace window
    pub fn update_unshield_vk(&mut self, cap: &AdminCap, vk: Vec<u8>) -> Result<(), PoolError> {
        self.authorise(cap)?;
        self.vks.unshield = vk;
        Ok(())
    }

    /// see [`Pool::update_unshield_vk`] on rotation timing
    pub fn update_transfer_vk(&mut self, cap: &AdminCap, vk: Vec<u8>) -> Result<(), PoolError> {
        self.authorise(cap)?;
        self.vks.transfer = vk;
        Ok(())
    }

    /// see [`Pool::update_unshield_vk`] on rotation timing
    pub fn update_swap_vk(&mut self, cap: &AdminCap, vk: Vec<u8>) -> Result<(), PoolError> {
        self.authorise(cap)?;
        self.vks.swap = vk;
        Ok(())
    }

    fn authorise(&self, cap: &AdminCap) -> Result<(), PoolError> {
        if cap.id != self.admin_cap || cap.pool != self.id {
            return Err(PoolError::NotAuthorised);
        }
        Ok(())
    }

    pub(crate) fn credit(&mut self, amount: u64) {
        self.balance += amount;
    }

    pub(crate) fn debit(&mut self, amount: u64) -> Result<(), PoolError> {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(PoolError::InsufficientBalance)?;
        Ok(())
    }
}

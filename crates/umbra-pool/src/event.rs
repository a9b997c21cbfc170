//! events emitted by successful operations
//!
//! events are the only channel note ciphertexts travel over; the client
//! scanner reconstructs the whole tree from them. emission happens strictly
//! after all state mutation, so observers never see partial effects.

use serde::{Deserialize, Serialize};

use umbra_core::{Address, Commitment, Nullifier};

use crate::pool::PoolId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldEvent {
    pub pool: PoolId,
    pub position: u64,
    pub commitment: Commitment,
    pub encrypted_note: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub pool: PoolId,
    pub input_nullifiers: [Nullifier; 2],
    pub output_positions: [u64; 2],
    pub output_commitments: [Commitment; 2],
    pub encrypted_notes: [Vec<u8>; 2],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnshieldEvent {
    pub pool: PoolId,
    pub nullifier: Nullifier,
    pub amount: u64,
    pub recipient: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub pool_in: PoolId,
    pub pool_out: PoolId,
    pub input_nullifiers: [Nullifier; 2],
    pub change_position: u64,
    pub output_position: u64,
    pub change_commitment: Commitment,
    pub output_commitment: Commitment,
    /// `[0]` encrypts the output note, `[1]` the change note
    pub encrypted_notes: [Vec<u8>; 2],
    pub amount_in: u64,
    pub amount_out: u64,
}

/// sum of everything a pool can emit, as consumed by scanners
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolEvent {
    Shield(ShieldEvent),
    Transfer(TransferEvent),
    Unshield(UnshieldEvent),
    Swap(SwapEvent),
}

impl PoolEvent {
    /// whether the event touches the given pool's state
    pub fn touches(&self, pool: &PoolId) -> bool {
        match self {
            PoolEvent::Shield(e) => e.pool == *pool,
            PoolEvent::Transfer(e) => e.pool == *pool,
            PoolEvent::Unshield(e) => e.pool == *pool,
            PoolEvent::Swap(e) => e.pool_in == *pool || e.pool_out == *pool,
        }
    }
}

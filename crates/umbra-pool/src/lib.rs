//! umbra pool state machine
//!
//! the proof-verifying side of the protocol: one mutable aggregate per
//! token type, advanced by four operations
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        POOL<T>                             │
//! ├────────────────────────────────────────────────────────────┤
//! │  balance ─ opaque token container                          │
//! │  tree    ─ depth-16 poseidon commitment tree               │
//! │  roots   ─ last 100 roots (stale-proof window)             │
//! │  spent   ─ nullifier registry, append-only                 │
//! │  vks     ─ unshield / transfer / swap verifying keys       │
//! ├────────────────────────────────────────────────────────────┤
//! │  shield      coin in, commitment appended                  │
//! │  unshield    proof burns a note, coin released             │
//! │  transfer    proof spends two notes into two fresh ones    │
//! │  swap        proof + external venue, value crosses pools   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! the host chain gives each transaction exclusive access to the pool
//! object, so nothing here locks; failures abort before any mutation and
//! events are emitted only on success.

pub mod dex;
pub mod error;
pub mod event;
pub mod ops;
pub mod pool;
pub mod registry;
pub mod tree;
pub mod verifier;

pub use dex::{DexError, DexVenue};
pub use error::PoolError;
pub use event::{PoolEvent, ShieldEvent, SwapEvent, TransferEvent, UnshieldEvent};
pub use ops::{shield, swap, swap_digest, transfer, unshield};
pub use pool::{AdminCap, CapId, Pool, PoolId, VerifyingKeys};
pub use registry::NullifierRegistry;
pub use tree::{zero_hash, CommitmentTree, RootRing, ROOT_HISTORY, TREE_DEPTH};
pub use verifier::{
    proof_bytes, Groth16System, ProofSystem, SwapInputs, TransferInputs, UnshieldInputs,
    PROOF_LEN,
};

//! failure taxonomy of the pool state machine
//!
//! every failure aborts the surrounding operation before any state is
//! mutated; nothing is retried inside the pool

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    /// public input bytes have the wrong length for the operation, or the
    /// verifying key expects a different input count
    #[error("public inputs malformed for this operation")]
    InvalidPublicInputs,

    /// proof argument is not the fixed 128-byte encoding
    #[error("proof must be {} bytes", crate::verifier::PROOF_LEN)]
    InvalidProofLength,

    /// shielded coin is of a different token type than the pool
    #[error("coin token does not match the pool")]
    WrongToken,

    /// shield of a zero-valued coin
    #[error("shielded value must be positive")]
    ZeroValue,

    /// referenced merkle root is neither current nor inside the accepted
    /// historical window
    #[error("merkle root is not current and outside the accepted window")]
    InvalidRoot,

    /// a referenced nullifier was already published
    #[error("nullifier already spent")]
    DoubleSpend,

    /// the verifier rejected the proof
    #[error("proof verification failed")]
    InvalidProof,

    /// stored verifying key bytes do not decode
    #[error("verifying key bytes are malformed")]
    MalformedVerifyingKey,

    /// pool balance cannot cover the requested outflow
    #[error("pool balance cannot cover the withdrawal")]
    InsufficientBalance,

    /// the dex returned less than the caller's minimum output
    #[error("dex returned less than the minimum output")]
    SlippageExceeded,

    /// commitment tree reached its fixed capacity; end of life for the pool
    #[error("commitment tree is full")]
    TreeFull,

    /// admin capability is bound to a different pool
    #[error("admin capability does not match this pool")]
    NotAuthorised,
}

//! error types for note discovery
//!
//! a blob that fails trial decryption is not an error, merely someone
//! else's note; errors here are about the event stream and the mirror

use thiserror::Error;

use crate::source::SourceError;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("event source failure: {0}")]
    Source(#[from] SourceError),

    /// commitments must arrive in emission order; proofs are refused while
    /// a position is missing
    #[error("commitment stream has a gap at position {0}")]
    GapOpen(u64),

    #[error("position {0} already holds a different commitment")]
    CommitmentConflict(u64),

    #[error("position {0} is outside the reconstructed tree")]
    UnknownPosition(u64),

    /// the reconstructed root does not match the chain; rescan from genesis
    #[error("reconstructed root diverges from the chain root, rescan required")]
    RootDivergence,

    #[error("commitment tree capacity exceeded")]
    TreeFull,
}

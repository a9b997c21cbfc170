//! external dex seam
//!
//! swaps route through a venue owned by a separate exchange contract; the
//! pool only sees this interface and the amount that came back

use thiserror::Error;

use umbra_core::TokenId;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DexError {
    #[error("dex could not satisfy the minimum output")]
    SlippageExceeded,
}

pub trait DexVenue {
    /// id the swap digest binds the user's intent to
    fn venue_id(&self) -> [u8; 32];

    /// exchange `amount_in` of `token_in` for at least `min_amount_out` of
    /// `token_out`, returning the amount actually produced
    fn execute(
        &mut self,
        token_in: TokenId,
        token_out: TokenId,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<u64, DexError>;
}

//! shielded notes
//!
//! a note is the off-chain record of value inside the pool; on-chain it
//! appears only as its poseidon commitment

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use crate::field::{fr_from_u64, fr_to_bytes, FieldBytes};
use crate::keys::MasterPublicKey;
use crate::poseidon::hash3;
use crate::value::TokenId;

/// off-chain secret record of shielded value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    /// per-note secret key, `P2(mpk, random)`
    pub nsk: Fr,
    /// token type the value is denominated in
    pub token: TokenId,
    /// amount, embedded into the field for hashing
    pub value: u64,
    /// blinding factor the nsk was derived from
    pub random: Fr,
}

impl Note {
    /// sender-side construction for a recipient identified by their mpk
    pub fn for_recipient(mpk: &MasterPublicKey, token: TokenId, value: u64, random: Fr) -> Self {
        Self {
            nsk: mpk.note_secret(random),
            token,
            value,
            random,
        }
    }

    /// the tree leaf this note is represented by
    pub fn commitment(&self) -> Commitment {
        let c = hash3(self.nsk, self.token.to_field(), fr_from_u64(self.value));
        Commitment(fr_to_bytes(&c))
    }
}

/// poseidon commitment binding a note's secret fields; the tree leaf
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(pub FieldBytes);

impl Commitment {
    pub fn to_bytes(&self) -> FieldBytes {
        self.0
    }

    pub fn from_bytes(bytes: FieldBytes) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::fr_from_u64;
    use crate::keys::SpendingKey;

    fn owner() -> MasterPublicKey {
        SpendingKey::from_bytes([5u8; 32]).master_public_key()
    }

    #[test]
    fn commitment_is_deterministic() {
        let token = TokenId::from_bytes([1u8; 32]);
        let note = Note::for_recipient(&owner(), token, 1_000, fr_from_u64(77));
        assert_eq!(note.commitment(), note.commitment());
    }

    #[test]
    fn commitment_binds_every_field() {
        let token = TokenId::from_bytes([1u8; 32]);
        let other_token = TokenId::from_bytes([2u8; 32]);
        let base = Note::for_recipient(&owner(), token, 1_000, fr_from_u64(77));

        let different_value = Note { value: 1_001, ..base.clone() };
        assert_ne!(base.commitment(), different_value.commitment());

        let different_token = Note { token: other_token, ..base.clone() };
        assert_ne!(base.commitment(), different_token.commitment());

        let different_random = Note::for_recipient(&owner(), token, 1_000, fr_from_u64(78));
        assert_ne!(base.commitment(), different_random.commitment());
    }
}

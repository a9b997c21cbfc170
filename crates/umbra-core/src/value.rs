//! token identifiers and public-side value containers

use serde::{Deserialize, Serialize};

use crate::field::{canonical_bytes, fr_from_bytes, FieldBytes};
use ark_bn254::Fr;

/// field-encoded identifier of a fungible token type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub FieldBytes);

impl TokenId {
    /// canonical id from arbitrary 32 bytes (reduced mod r)
    pub fn from_bytes(bytes: FieldBytes) -> Self {
        Self(canonical_bytes(&bytes))
    }

    pub fn to_field(&self) -> Fr {
        fr_from_bytes(&self.0)
    }

    pub fn to_bytes(&self) -> FieldBytes {
        self.0
    }
}

/// a deposited quantity of a declared token type, handed over by the host
/// at shield time and released by it at unshield time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Coin {
    pub token: TokenId,
    pub value: u64,
}

impl Coin {
    pub fn new(token: TokenId, value: u64) -> Self {
        Self { token, value }
    }
}

/// public host-side address receiving unshielded funds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

//! bn254 scalar field codec
//!
//! every protocol scalar travels as 32 little-endian bytes and is reduced
//! mod r on the way in

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};

/// 32-byte little-endian encoding of a field element
pub type FieldBytes = [u8; 32];

/// decode little-endian bytes, reducing mod r
pub fn fr_from_bytes(bytes: &FieldBytes) -> Fr {
    Fr::from_le_bytes_mod_order(bytes)
}

/// canonical little-endian encoding
pub fn fr_to_bytes(value: &Fr) -> FieldBytes {
    let repr = value.into_bigint().to_bytes_le();
    let mut out = [0u8; 32];
    out[..repr.len()].copy_from_slice(&repr);
    out
}

/// embed an amount into the field
pub fn fr_from_u64(value: u64) -> Fr {
    Fr::from(value)
}

/// reduce arbitrary bytes to a canonical 32-byte encoding
pub fn canonical_bytes(bytes: &FieldBytes) -> FieldBytes {
    fr_to_bytes(&fr_from_bytes(bytes))
}

//! fixed-arity poseidon instances
//!
//! one circom-compatible parameter set over the bn254 scalar field, shared
//! by tree hashing, the key chain, commitments, nullifiers and the swap
//! digest. the circuit side is compiled against the same tables, so any
//! change here breaks root agreement with deployed verifying keys.

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};

use crate::field::{fr_from_bytes, fr_to_bytes, FieldBytes};

/// two-input permutation: tree nodes, key chain, nullifiers
pub fn hash2(a: Fr, b: Fr) -> Fr {
    hash_fixed(&[a, b])
}

/// three-input permutation: note commitments
pub fn hash3(a: Fr, b: Fr, c: Fr) -> Fr {
    hash_fixed(&[a, b, c])
}

/// five-input permutation: swap parameter digest
pub fn hash5(a: Fr, b: Fr, c: Fr, d: Fr, e: Fr) -> Fr {
    hash_fixed(&[a, b, c, d, e])
}

/// byte-level convenience for tree node hashing, left child first
pub fn hash2_bytes(left: &FieldBytes, right: &FieldBytes) -> FieldBytes {
    fr_to_bytes(&hash2(fr_from_bytes(left), fr_from_bytes(right)))
}

fn hash_fixed(inputs: &[Fr]) -> Fr {
    // widths 2/3/5 are always in the circom parameter tables, and the input
    // slice length equals the requested width by construction
    let mut hasher = Poseidon::<Fr>::new_circom(inputs.len()).expect("poseidon width");
    hasher.hash(inputs).expect("poseidon input count")
}

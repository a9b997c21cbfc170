//! proof verifier adapter
//!
//! wraps the host's groth16-over-bn254 verifier behind a seam the
//! operations call through. public inputs arrive as concatenated 32-byte
//! little-endian field encodings in a fixed per-operation order; length
//! mismatches are rejected before the verifier is ever invoked.
//!
//! the unshield circuit additionally binds the withdrawn amount: the
//! declared `amount` is appended as a fourth verifier input at parse time,
//! so a caller lying about it produces a proof that fails verification
//! instead of an incorrect payout.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{prepare_verifying_key, Groth16, Proof, VerifyingKey};
use ark_serialize::CanonicalDeserialize;

use umbra_core::field::{canonical_bytes, fr_from_bytes, fr_from_u64};
use umbra_core::{Commitment, FieldBytes, Nullifier};

use crate::error::PoolError;

/// fixed compressed proof encoding: G1 ‖ G2 ‖ G1
pub const PROOF_LEN: usize = 128;

/// seam over the host's pairing verifier
pub trait ProofSystem {
    fn verify(
        &self,
        vk: &[u8],
        public_inputs: &[Fr],
        proof: &[u8; PROOF_LEN],
    ) -> Result<bool, PoolError>;
}

/// production verifier over compressed bn254 encodings
#[derive(Clone, Copy, Debug, Default)]
pub struct Groth16System;

impl ProofSystem for Groth16System {
    fn verify(
        &self,
        vk: &[u8],
        public_inputs: &[Fr],
        proof: &[u8; PROOF_LEN],
    ) -> Result<bool, PoolError> {
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(vk)
            .map_err(|_| PoolError::MalformedVerifyingKey)?;
        if vk.gamma_abc_g1.len() != public_inputs.len() + 1 {
            return Err(PoolError::InvalidPublicInputs);
        }

        let proof = Proof::<Bn254>::deserialize_compressed(&proof[..])
            .map_err(|_| PoolError::InvalidProof)?;

        let pvk = prepare_verifying_key(&vk);
        Groth16::<Bn254>::verify_proof(&pvk, &proof, public_inputs)
            .map_err(|_| PoolError::InvalidProof)
    }
}

/// check and coerce a proof argument to the fixed length
pub fn proof_bytes(proof: &[u8]) -> Result<&[u8; PROOF_LEN], PoolError> {
    proof.try_into().map_err(|_| PoolError::InvalidProofLength)
}

fn split_fields<const N: usize>(bytes: &[u8]) -> Result<[FieldBytes; N], PoolError> {
    if bytes.len() != N * 32 {
        return Err(PoolError::InvalidPublicInputs);
    }
    let mut out = [[0u8; 32]; N];
    for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(32)) {
        let mut raw = [0u8; 32];
        raw.copy_from_slice(chunk);
        // arbitrary byte strings are reduced mod r on input
        *slot = canonical_bytes(&raw);
    }
    Ok(out)
}

/// unshield layout: `root ‖ nullifier ‖ commitment_spent`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnshieldInputs {
    pub merkle_root: FieldBytes,
    pub nullifier: Nullifier,
    pub commitment_spent: Commitment,
}

impl UnshieldInputs {
    pub const LEN: usize = 96;

    pub fn parse(bytes: &[u8]) -> Result<Self, PoolError> {
        let [root, nullifier, commitment] = split_fields::<3>(bytes)?;
        Ok(Self {
            merkle_root: root,
            nullifier: Nullifier::from_bytes(nullifier),
            commitment_spent: Commitment::from_bytes(commitment),
        })
    }

    /// inputs as handed to the circuit, with the amount bound as the
    /// fourth element
    pub fn verifier_inputs(&self, amount: u64) -> Vec<Fr> {
        vec![
            fr_from_bytes(&self.merkle_root),
            fr_from_bytes(&self.nullifier.to_bytes()),
            fr_from_bytes(&self.commitment_spent.to_bytes()),
            fr_from_u64(amount),
        ]
    }
}

/// transfer layout: `root ‖ nullifier_1 ‖ nullifier_2 ‖ out_1 ‖ out_2`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferInputs {
    pub merkle_root: FieldBytes,
    pub nullifiers: [Nullifier; 2],
    pub commitments_out: [Commitment; 2],
}

impl TransferInputs {
    pub const LEN: usize = 160;

    pub fn parse(bytes: &[u8]) -> Result<Self, PoolError> {
        let [root, n1, n2, c1, c2] = split_fields::<5>(bytes)?;
        Ok(Self {
            merkle_root: root,
            nullifiers: [Nullifier::from_bytes(n1), Nullifier::from_bytes(n2)],
            commitments_out: [Commitment::from_bytes(c1), Commitment::from_bytes(c2)],
        })
    }

    pub fn verifier_inputs(&self) -> Vec<Fr> {
        vec![
            fr_from_bytes(&self.merkle_root),
            fr_from_bytes(&self.nullifiers[0].to_bytes()),
            fr_from_bytes(&self.nullifiers[1].to_bytes()),
            fr_from_bytes(&self.commitments_out[0].to_bytes()),
            fr_from_bytes(&self.commitments_out[1].to_bytes()),
        ]
    }
}

/// swap layout: `root ‖ nullifier_1 ‖ nullifier_2 ‖ out ‖ change ‖ digest`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapInputs {
    pub merkle_root: FieldBytes,
    pub nullifiers: [Nullifier; 2],
    pub commitment_out: Commitment,
    pub commitment_change: Commitment,
    pub swap_data_hash: FieldBytes,
}

impl SwapInputs {
    pub const LEN: usize = 192;

    pub fn parse(bytes: &[u8]) -> Result<Self, PoolError> {
        let [root, n1, n2, out, change, digest] = split_fields::<6>(bytes)?;
        Ok(Self {
            merkle_root: root,
            nullifiers: [Nullifier::from_bytes(n1), Nullifier::from_bytes(n2)],
            commitment_out: Commitment::from_bytes(out),
            commitment_change: Commitment::from_bytes(change),
            swap_data_hash: digest,
        })
    }

    pub fn verifier_inputs(&self) -> Vec<Fr> {
        vec![
            fr_from_bytes(&self.merkle_root),
            fr_from_bytes(&self.nullifiers[0].to_bytes()),
            fr_from_bytes(&self.nullifiers[1].to_bytes()),
            fr_from_bytes(&self.commitment_out.to_bytes()),
            fr_from_bytes(&self.commitment_change.to_bytes()),
            fr_from_bytes(&self.swap_data_hash),
        ]
    }
}

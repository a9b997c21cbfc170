//! groth16 fixtures for the scenario tests
//!
//! each operation gets a real verifying key from circuit-specific setup
//! over a binding circuit: every public input is pinned by a trivial
//! constraint, so a proof only verifies against the exact inputs it was
//! generated for. that is all the scenarios need from the proof system.

#![allow(dead_code)]

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, ProvingKey};
use ark_relations::{
    lc,
    r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError, Variable},
};
use ark_serialize::CanonicalSerialize;
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use umbra_core::field::fr_to_bytes;
use umbra_pool::PROOF_LEN;

/// circuit with `publics.len()` public inputs and nothing else
#[derive(Clone)]
struct BindingCircuit {
    publics: Vec<Option<Fr>>,
}

impl ConstraintSynthesizer<Fr> for BindingCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        for value in self.publics {
            let var = cs.new_input_variable(|| value.ok_or(SynthesisError::AssignmentMissing))?;
            cs.enforce_constraint(lc!() + var, lc!() + Variable::One, lc!() + var)?;
        }
        Ok(())
    }
}

/// proving key plus the serialized verifying key a pool stores
pub struct TestProver {
    pk: ProvingKey<Bn254>,
    pub vk_bytes: Vec<u8>,
}

impl TestProver {
    pub fn new(public_inputs: usize, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let circuit = BindingCircuit {
            publics: vec![None; public_inputs],
        };
        let (pk, vk) =
            Groth16::<Bn254>::circuit_specific_setup(circuit, &mut rng).expect("setup");
        let mut vk_bytes = Vec::new();
        vk.serialize_compressed(&mut vk_bytes).expect("vk encoding");
        Self { pk, vk_bytes }
    }

    /// produce the fixed 128-byte compressed proof for these inputs
    pub fn prove(&self, publics: &[Fr]) -> Vec<u8> {
        let mut rng = ChaCha20Rng::seed_from_u64(0xdead);
        let circuit = BindingCircuit {
            publics: publics.iter().copied().map(Some).collect(),
        };
        let proof = Groth16::<Bn254>::prove(&self.pk, circuit, &mut rng).expect("prove");
        let mut bytes = Vec::new();
        proof.serialize_compressed(&mut bytes).expect("proof encoding");
        assert_eq!(bytes.len(), PROOF_LEN);
        bytes
    }
}

/// concatenate field elements into the 32-byte little-endian wire layout
pub fn input_bytes(fields: &[Fr]) -> Vec<u8> {
    let mut out = Vec::with_capacity(fields.len() * 32);
    for f in fields {
        out.extend_from_slice(&fr_to_bytes(f));
    }
    out
}

//! the four value-moving operations
//!
//! all proof-carrying operations share one preamble: check argument sizes,
//! parse public inputs, validate the referenced root against the pool's
//! window, require every referenced nullifier to be fresh, then verify the
//! proof. only after the last check passes is state mutated, in a fixed
//! order: nullifiers, then output commitments (capturing positions), then
//! the token balance, then the event. a failure at any point leaves the
//! pool untouched.

use umbra_core::field::{fr_from_bytes, fr_from_u64, fr_to_bytes};
use umbra_core::poseidon::hash5;
use umbra_core::{Address, Coin, Commitment, FieldBytes, TokenId};

use crate::dex::DexVenue;
use crate::error::PoolError;
use crate::event::{ShieldEvent, SwapEvent, TransferEvent, UnshieldEvent};
use crate::pool::Pool;
use crate::verifier::{proof_bytes, ProofSystem, SwapInputs, TransferInputs, UnshieldInputs};

/// deposit a public coin, adding its commitment to the tree
///
/// no proof is needed: nothing prior is being consumed, and privacy comes
/// from the note being indistinguishable from every other leaf
pub fn shield(
    pool: &mut Pool,
    coin: Coin,
    commitment: Commitment,
    encrypted_note: Vec<u8>,
) -> Result<ShieldEvent, PoolError> {
    if coin.token != pool.token() {
        return Err(PoolError::WrongToken);
    }
    if coin.value == 0 {
        return Err(PoolError::ZeroValue);
    }

    let position = pool.tree.insert(&commitment)?;
    let root = pool.tree.root();
    pool.roots.push(root);
    pool.credit(coin.value);

    Ok(ShieldEvent {
        pool: pool.id(),
        position,
        commitment,
        encrypted_note,
    })
}

/// burn a note and release its value to a public address
pub fn unshield<V: ProofSystem>(
    pool: &mut Pool,
    verifier: &V,
    proof: &[u8],
    public_inputs: &[u8],
    amount: u64,
    recipient: Address,
) -> Result<UnshieldEvent, PoolError> {
    let proof = proof_bytes(proof)?;
    let inputs = UnshieldInputs::parse(public_inputs)?;

    if !pool.is_known_root(&inputs.merkle_root) {
        return Err(PoolError::InvalidRoot);
    }
    if pool.nullifiers.contains(&inputs.nullifier) {
        return Err(PoolError::DoubleSpend);
    }
    if !verifier.verify(pool.unshield_vk(), &inputs.verifier_inputs(amount), proof)? {
        return Err(PoolError::InvalidProof);
    }
    if pool.balance() < amount {
        return Err(PoolError::InsufficientBalance);
    }

    pool.nullifiers.insert(inputs.nullifier)?;
    pool.debit(amount)?;

    Ok(UnshieldEvent {
        pool: pool.id(),
        nullifier: inputs.nullifier,
        amount,
        recipient,
    })
}

/// spend two notes (one may be a zero-valued dummy) into two fresh ones;
/// the pool balance is untouched
pub fn transfer<V: ProofSystem>(
    pool: &mut Pool,
    verifier: &V,
    proof: &[u8],
    public_inputs: &[u8],
    encrypted_notes: [Vec<u8>; 2],
) -> Result<TransferEvent, PoolError> {
    let proof = proof_bytes(proof)?;
    let inputs = TransferInputs::parse(public_inputs)?;

    if !pool.is_known_root(&inputs.merkle_root) {
        return Err(PoolError::InvalidRoot);
    }
    if inputs.nullifiers[0] == inputs.nullifiers[1] {
        return Err(PoolError::DoubleSpend);
    }
    for nullifier in &inputs.nullifiers {
        if pool.nullifiers.contains(nullifier) {
            return Err(PoolError::DoubleSpend);
        }
    }
    if !verifier.verify(pool.transfer_vk(), &inputs.verifier_inputs(), proof)? {
        return Err(PoolError::InvalidProof);
    }
    // both outputs must fit before anything is written
    if pool.tree.next_leaf_index() + 2 > pool.tree.capacity() {
        return Err(PoolError::TreeFull);
    }

    pool.nullifiers.insert(inputs.nullifiers[0])?;
    pool.nullifiers.insert(inputs.nullifiers[1])?;

    let mut output_positions = [0u64; 2];
    for (slot, commitment) in output_positions.iter_mut().zip(&inputs.commitments_out) {
        *slot = pool.tree.insert(commitment)?;
        let root = pool.tree.root();
        pool.roots.push(root);
    }

    Ok(TransferEvent {
        pool: pool.id(),
        input_nullifiers: inputs.nullifiers,
        output_positions,
        output_commitments: inputs.commitments_out,
        encrypted_notes,
    })
}

/// spend notes on the input pool, exchange through an external venue and
/// materialise the proceeds as a note on the output pool
///
/// the committed root and both nullifiers belong to the input side; the
/// swap digest in the sixth public input pins the user's intent to the
/// tokens, amounts and venue actually used
#[allow(clippy::too_many_arguments)]
pub fn swap<V: ProofSystem, D: DexVenue>(
    pool_in: &mut Pool,
    pool_out: &mut Pool,
    dex: &mut D,
    verifier: &V,
    proof: &[u8],
    public_inputs: &[u8],
    amount_in: u64,
    min_amount_out: u64,
    encrypted_notes: [Vec<u8>; 2],
) -> Result<SwapEvent, PoolError> {
    let proof = proof_bytes(proof)?;
    let inputs = SwapInputs::parse(public_inputs)?;

    let expected_digest = swap_digest(
        pool_in.token(),
        pool_out.token(),
        amount_in,
        min_amount_out,
        dex.venue_id(),
    );
    if inputs.swap_data_hash != expected_digest {
        return Err(PoolError::InvalidPublicInputs);
    }

    if !pool_in.is_known_root(&inputs.merkle_root) {
        return Err(PoolError::InvalidRoot);
    }
    if inputs.nullifiers[0] == inputs.nullifiers[1] {
        return Err(PoolError::DoubleSpend);
    }
    for nullifier in &inputs.nullifiers {
        if pool_in.nullifiers.contains(nullifier) {
            return Err(PoolError::DoubleSpend);
        }
    }
    if !verifier.verify(pool_in.swap_vk(), &inputs.verifier_inputs(), proof)? {
        return Err(PoolError::InvalidProof);
    }
    if pool_in.balance() < amount_in {
        return Err(PoolError::InsufficientBalance);
    }
    if pool_in.tree.is_full() || pool_out.tree.is_full() {
        return Err(PoolError::TreeFull);
    }

    // the venue either delivers at least the minimum or the whole
    // transaction aborts; the host composes both pools atomically
    let amount_out = dex
        .execute(pool_in.token(), pool_out.token(), amount_in, min_amount_out)
        .map_err(|_| PoolError::SlippageExceeded)?;

    pool_in.nullifiers.insert(inputs.nullifiers[0])?;
    pool_in.nullifiers.insert(inputs.nullifiers[1])?;

    let change_position = pool_in.tree.insert(&inputs.commitment_change)?;
    let root_in = pool_in.tree.root();
    pool_in.roots.push(root_in);

    let output_position = pool_out.tree.insert(&inputs.commitment_out)?;
    let root_out = pool_out.tree.root();
    pool_out.roots.push(root_out);

    pool_in.debit(amount_in)?;
    pool_out.credit(amount_out);

    Ok(SwapEvent {
        pool_in: pool_in.id(),
        pool_out: pool_out.id(),
        input_nullifiers: inputs.nullifiers,
        change_position,
        output_position,
        change_commitment: inputs.commitment_change,
        output_commitment: inputs.commitment_out,
        encrypted_notes,
        amount_in,
        amount_out,
    })
}

/// digest binding a swap's intent: `P5(T_in, T_out, amount_in,
/// min_amount_out, venue_id)`
pub fn swap_digest(
    token_in: TokenId,
    token_out: TokenId,
    amount_in: u64,
    min_amount_out: u64,
    venue_id: [u8; 32],
) -> FieldBytes {
    fr_to_bytes(&hash5(
        token_in.to_field(),
        token_out.to_field(),
        fr_from_u64(amount_in),
        fr_from_u64(min_amount_out),
        fr_from_bytes(&venue_id),
    ))
}

//! cold-start reconstruction of pool history from the event log

use ark_bn254::Fr;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use umbra_core::field::{fr_from_bytes, fr_from_u64};
use umbra_core::{Address, Coin, Commitment, Note, NoteCiphertext, Nullifier, SpendingKey, TokenId};
use umbra_pool::{
    shield, swap, swap_digest, transfer, unshield, DexError, DexVenue, Pool, PoolError,
    PoolEvent, PoolId, ProofSystem, VerifyingKeys, PROOF_LEN,
};
use umbra_sync::{Cursor, EventSource, MemoryEventIndex, NoteScanner, SourceError, SyncError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// the scanner never verifies proofs, so the pools in this suite run with
/// a verifier stub and empty keys
struct AcceptAll;

impl ProofSystem for AcceptAll {
    fn verify(
        &self,
        _vk: &[u8],
        _public_inputs: &[Fr],
        _proof: &[u8; PROOF_LEN],
    ) -> Result<bool, PoolError> {
        Ok(true)
    }
}

struct FixedRateDex {
    venue: [u8; 32],
    amount_out: u64,
}

impl DexVenue for FixedRateDex {
    fn venue_id(&self) -> [u8; 32] {
        self.venue
    }

    fn execute(
        &mut self,
        _token_in: TokenId,
        _token_out: TokenId,
        _amount_in: u64,
        min_amount_out: u64,
    ) -> Result<u64, DexError> {
        if self.amount_out < min_amount_out {
            return Err(DexError::SlippageExceeded);
        }
        Ok(self.amount_out)
    }
}

fn input_bytes(fields: &[Fr]) -> Vec<u8> {
    let mut out = Vec::with_capacity(fields.len() * 32);
    for f in fields {
        out.extend_from_slice(&umbra_core::fr_to_bytes(f));
    }
    out
}

fn shield_for(
    pool: &mut Pool,
    index: &mut MemoryEventIndex,
    owner: &SpendingKey,
    value: u64,
    rng: &mut ChaCha20Rng,
) -> (Note, u64) {
    let note = Note::for_recipient(
        &owner.master_public_key(),
        pool.token(),
        value,
        fr_from_u64(rng.next_u64()),
    );
    let blob = NoteCiphertext::encrypt(&note, &owner.viewing_public(), rng)
        .unwrap()
        .to_bytes();
    let event = shield(pool, Coin::new(pool.token(), value), note.commitment(), blob).unwrap();
    let position = event.position;
    index.publish(PoolEvent::Shield(event));
    (note, position)
}

/// replay the full protocol history: shield/unshield, a transfer to a
/// counterparty, and a cross-pool swap
struct History {
    sui: Pool,
    usdc: Pool,
    index: MemoryEventIndex,
    owner: SpendingKey,
    recipient: SpendingKey,
}

fn build_history() -> History {
    let mut rng = ChaCha20Rng::seed_from_u64(100);
    let (mut sui, _) = Pool::new(
        PoolId([1u8; 32]),
        TokenId::from_bytes([11u8; 32]),
        VerifyingKeys::default(),
    );
    let (mut usdc, _) = Pool::new(
        PoolId([2u8; 32]),
        TokenId::from_bytes([22u8; 32]),
        VerifyingKeys::default(),
    );
    let mut index = MemoryEventIndex::new();
    let owner = SpendingKey::random(&mut rng);
    let recipient = SpendingKey::random(&mut rng);
    let nk = owner.nullifying_key();

    // shield 1_000_000 then burn it to a public address
    let (big_note, big_pos) = shield_for(&mut sui, &mut index, &owner, 1_000_000, &mut rng);
    let nullifier = Nullifier::derive(&nk, big_pos);
    let publics = vec![
        fr_from_bytes(&sui.current_root()),
        fr_from_bytes(&nullifier.to_bytes()),
        fr_from_bytes(&big_note.commitment().to_bytes()),
    ];
    let event = unshield(
        &mut sui,
        &AcceptAll,
        &[0u8; PROOF_LEN],
        &input_bytes(&publics),
        1_000_000,
        Address([0xAA; 32]),
    )
    .unwrap();
    index.publish(PoolEvent::Unshield(event));

    // shield 500 + 300, transfer 700 to the counterparty with 100 change
    let (_, pos_a) = shield_for(&mut sui, &mut index, &owner, 500, &mut rng);
    let (_, pos_b) = shield_for(&mut sui, &mut index, &owner, 300, &mut rng);

    let out_main = Note::for_recipient(
        &recipient.master_public_key(),
        sui.token(),
        700,
        fr_from_u64(rng.next_u64()),
    );
    let out_change = Note::for_recipient(
        &owner.master_public_key(),
        sui.token(),
        100,
        fr_from_u64(rng.next_u64()),
    );
    let blob_main = NoteCiphertext::encrypt(&out_main, &recipient.viewing_public(), &mut rng)
        .unwrap()
        .to_bytes();
    let blob_change = NoteCiphertext::encrypt(&out_change, &owner.viewing_public(), &mut rng)
        .unwrap()
        .to_bytes();
    let publics = vec![
        fr_from_bytes(&sui.current_root()),
        fr_from_bytes(&Nullifier::derive(&nk, pos_a).to_bytes()),
        fr_from_bytes(&Nullifier::derive(&nk, pos_b).to_bytes()),
        fr_from_bytes(&out_main.commitment().to_bytes()),
        fr_from_bytes(&out_change.commitment().to_bytes()),
    ];
    let event = transfer(
        &mut sui,
        &AcceptAll,
        &[0u8; PROOF_LEN],
        &input_bytes(&publics),
        [blob_main, blob_change],
    )
    .unwrap();
    index.publish(PoolEvent::Transfer(event));

    // shield 10_000 and swap 1_000 of it into the usdc pool
    let (_, pos_c) = shield_for(&mut sui, &mut index, &owner, 10_000, &mut rng);
    let out_note = Note::for_recipient(
        &owner.master_public_key(),
        usdc.token(),
        2_500,
        fr_from_u64(rng.next_u64()),
    );
    let change_note = Note::for_recipient(
        &owner.master_public_key(),
        sui.token(),
        9_000,
        fr_from_u64(rng.next_u64()),
    );
    let blob_out = NoteCiphertext::encrypt(&out_note, &owner.viewing_public(), &mut rng)
        .unwrap()
        .to_bytes();
    let blob_change = NoteCiphertext::encrypt(&change_note, &owner.viewing_public(), &mut rng)
        .unwrap()
        .to_bytes();
    let mut dex = FixedRateDex {
        venue: [7u8; 32],
        amount_out: 2_500,
    };
    let digest = swap_digest(sui.token(), usdc.token(), 1_000, 2_450, dex.venue_id());
    let publics = vec![
        fr_from_bytes(&sui.current_root()),
        fr_from_bytes(&Nullifier::derive(&nk, pos_c).to_bytes()),
        fr_from_bytes(&Nullifier::derive(&nk, 999).to_bytes()),
        fr_from_bytes(&out_note.commitment().to_bytes()),
        fr_from_bytes(&change_note.commitment().to_bytes()),
        fr_from_bytes(&digest),
    ];
    let event = swap(
        &mut sui,
        &mut usdc,
        &mut dex,
        &AcceptAll,
        &[0u8; PROOF_LEN],
        &input_bytes(&publics),
        1_000,
        2_450,
        [blob_out, blob_change],
    )
    .unwrap();
    index.publish(PoolEvent::Swap(event));

    History {
        sui,
        usdc,
        index,
        owner,
        recipient,
    }
}

#[tokio::test]
async fn cold_start_scan_reconstructs_owned_notes() {
    init_tracing();
    let h = build_history();

    let mut scanner = NoteScanner::new(h.sui.id(), h.owner.clone());
    let ingested = scanner.sync(&h.index).await.unwrap();
    assert!(ingested > 0);

    // the mirror must agree with the chain bit-for-bit
    scanner.verify_chain_root(&h.sui.current_root()).unwrap();

    // owner decrypted every note addressed to them on the sui pool
    let owned_values: Vec<u64> = scanner.owned_notes().map(|n| n.note.value).collect();
    assert_eq!(owned_values, vec![1_000_000, 500, 300, 100, 10_000, 9_000]);

    // everything but the change notes has been nullified
    assert_eq!(scanner.balance(), 9_100);
    assert_eq!(scanner.spent_balance(), 1_000_000 + 500 + 300 + 10_000);
    assert_eq!(scanner.unspent_notes().count(), 2);
    let spendable = scanner.spendable_notes(&h.index).await.unwrap();
    let mut spendable_values: Vec<u64> = spendable.iter().map(|s| s.note.value).collect();
    spendable_values.sort_unstable();
    assert_eq!(spendable_values, vec![100, 9_000]);

    // each spendable note carries a path that verifies against the root
    for note in &spendable {
        assert!(note
            .path
            .verify(&note.note.commitment(), &h.sui.current_root()));
    }
}

#[tokio::test]
async fn counterparty_recovers_exactly_their_note() {
    let h = build_history();

    let mut scanner = NoteScanner::new(h.sui.id(), h.recipient.clone());
    scanner.sync(&h.index).await.unwrap();
    scanner.verify_chain_root(&h.sui.current_root()).unwrap();

    let owned: Vec<u64> = scanner.owned_notes().map(|n| n.note.value).collect();
    assert_eq!(owned, vec![700]);
    assert_eq!(scanner.balance(), 700);
}

#[tokio::test]
async fn swap_output_lands_in_the_other_pool() {
    let h = build_history();

    let mut scanner = NoteScanner::new(h.usdc.id(), h.owner.clone());
    scanner.sync(&h.index).await.unwrap();
    scanner.verify_chain_root(&h.usdc.current_root()).unwrap();

    let owned: Vec<u64> = scanner.owned_notes().map(|n| n.note.value).collect();
    assert_eq!(owned, vec![2_500]);
    let spendable = scanner.spendable_notes(&h.index).await.unwrap();
    assert_eq!(spendable.len(), 1);
    assert_eq!(spendable[0].position, 0);
}

#[tokio::test]
async fn self_transfer_leaves_spendable_balance_unchanged() {
    let mut rng = ChaCha20Rng::seed_from_u64(500);
    let (mut pool, _) = Pool::new(
        PoolId([4u8; 32]),
        TokenId::from_bytes([11u8; 32]),
        VerifyingKeys::default(),
    );
    let mut index = MemoryEventIndex::new();
    let owner = SpendingKey::random(&mut rng);
    let nk = owner.nullifying_key();

    let (_, pos_a) = shield_for(&mut pool, &mut index, &owner, 100, &mut rng);
    let (_, pos_b) = shield_for(&mut pool, &mut index, &owner, 200, &mut rng);

    let mut scanner = NoteScanner::new(pool.id(), owner.clone());
    scanner.sync(&index).await.unwrap();
    assert_eq!(scanner.balance(), 300);

    // both outputs come straight back to the sender
    let out_a = Note::for_recipient(
        &owner.master_public_key(),
        pool.token(),
        250,
        fr_from_u64(rng.next_u64()),
    );
    let out_b = Note::for_recipient(
        &owner.master_public_key(),
        pool.token(),
        50,
        fr_from_u64(rng.next_u64()),
    );
    let blob_a = NoteCiphertext::encrypt(&out_a, &owner.viewing_public(), &mut rng)
        .unwrap()
        .to_bytes();
    let blob_b = NoteCiphertext::encrypt(&out_b, &owner.viewing_public(), &mut rng)
        .unwrap()
        .to_bytes();
    let publics = vec![
        fr_from_bytes(&pool.current_root()),
        fr_from_bytes(&Nullifier::derive(&nk, pos_a).to_bytes()),
        fr_from_bytes(&Nullifier::derive(&nk, pos_b).to_bytes()),
        fr_from_bytes(&out_a.commitment().to_bytes()),
        fr_from_bytes(&out_b.commitment().to_bytes()),
    ];
    let event = transfer(
        &mut pool,
        &AcceptAll,
        &[0u8; PROOF_LEN],
        &input_bytes(&publics),
        [blob_a, blob_b],
    )
    .unwrap();
    index.publish(PoolEvent::Transfer(event));

    scanner.sync(&index).await.unwrap();
    assert_eq!(scanner.balance(), 300);
    let spendable = scanner.spendable_notes(&index).await.unwrap();
    let mut values: Vec<u64> = spendable.iter().map(|s| s.note.value).collect();
    values.sort_unstable();
    assert_eq!(values, vec![50, 250]);
}

#[tokio::test]
async fn incremental_scan_equals_cold_scan() {
    let mut rng = ChaCha20Rng::seed_from_u64(200);
    let (mut pool, _) = Pool::new(
        PoolId([5u8; 32]),
        TokenId::from_bytes([11u8; 32]),
        VerifyingKeys::default(),
    );
    let mut index = MemoryEventIndex::new();
    let owner = SpendingKey::random(&mut rng);

    shield_for(&mut pool, &mut index, &owner, 10, &mut rng);
    let mut incremental = NoteScanner::new(pool.id(), owner.clone());
    incremental.sync(&index).await.unwrap();
    let cursor_after_first = incremental.cursor();

    shield_for(&mut pool, &mut index, &owner, 20, &mut rng);
    shield_for(&mut pool, &mut index, &owner, 30, &mut rng);
    let ingested = incremental.sync(&index).await.unwrap();
    assert_eq!(ingested, 2);
    assert!(incremental.cursor() > cursor_after_first);

    let mut cold = NoteScanner::new(pool.id(), owner.clone());
    cold.sync(&index).await.unwrap();

    assert_eq!(cold.root(), incremental.root());
    assert_eq!(cold.balance(), incremental.balance());
    assert_eq!(
        cold.owned_notes().count(),
        incremental.owned_notes().count()
    );

    // a second pass over a quiet index is a no-op
    assert_eq!(incremental.sync(&index).await.unwrap(), 0);
}

#[tokio::test]
async fn onchain_registry_catches_foreign_spends() {
    let mut rng = ChaCha20Rng::seed_from_u64(300);
    let (mut pool, _) = Pool::new(
        PoolId([6u8; 32]),
        TokenId::from_bytes([11u8; 32]),
        VerifyingKeys::default(),
    );
    let mut index = MemoryEventIndex::new();
    let owner = SpendingKey::random(&mut rng);

    let (note, position) = shield_for(&mut pool, &mut index, &owner, 400, &mut rng);

    let mut scanner = NoteScanner::new(pool.id(), owner.clone());
    scanner.sync(&index).await.unwrap();
    assert_eq!(scanner.spendable_notes(&index).await.unwrap().len(), 1);

    // the note is burned after the scanner's last sync
    let nullifier = Nullifier::derive(&owner.nullifying_key(), position);
    let publics = vec![
        fr_from_bytes(&pool.current_root()),
        fr_from_bytes(&nullifier.to_bytes()),
        fr_from_bytes(&note.commitment().to_bytes()),
    ];
    let event = unshield(
        &mut pool,
        &AcceptAll,
        &[0u8; PROOF_LEN],
        &input_bytes(&publics),
        400,
        Address([0xEE; 32]),
    )
    .unwrap();
    index.publish(PoolEvent::Unshield(event));

    // without re-syncing, the on-chain cross-check already excludes it
    assert!(scanner.spendable_notes(&index).await.unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_roundtrips_through_serde() {
    let h = build_history();

    let mut scanner = NoteScanner::new(h.sui.id(), h.owner.clone());
    scanner.sync(&h.index).await.unwrap();

    let snapshot = scanner.snapshot().unwrap();
    let json = serde_json::to_string(&snapshot).unwrap();
    let restored = NoteScanner::restore(
        h.sui.id(),
        h.owner.clone(),
        serde_json::from_str(&json).unwrap(),
    )
    .unwrap();

    assert_eq!(restored.root(), scanner.root());
    assert_eq!(restored.balance(), scanner.balance());
    assert_eq!(restored.cursor(), scanner.cursor());

    // the restored scanner picks up exactly where the original stopped
    let mut restored = restored;
    assert_eq!(restored.sync(&h.index).await.unwrap(), 0);
}

#[tokio::test]
async fn rescan_from_genesis_is_idempotent() {
    let h = build_history();

    let mut scanner = NoteScanner::new(h.sui.id(), h.owner.clone());
    scanner.sync(&h.index).await.unwrap();
    let first_root = scanner.root();
    let first_balance = scanner.balance();
    let first_owned: Vec<Commitment> =
        scanner.owned_notes().map(|n| n.commitment).collect();

    scanner.reset();
    assert_eq!(scanner.cursor(), None);
    scanner.sync(&h.index).await.unwrap();

    assert_eq!(scanner.root(), first_root);
    assert_eq!(scanner.balance(), first_balance);
    let second_owned: Vec<Commitment> =
        scanner.owned_notes().map(|n| n.commitment).collect();
    assert_eq!(second_owned, first_owned);
}

/// event source that drops the first `failures` page requests
struct FlakySource<'a> {
    inner: &'a MemoryEventIndex,
    failures: std::cell::Cell<u32>,
}

impl EventSource for FlakySource<'_> {
    async fn page(
        &self,
        pool: &PoolId,
        after: Option<Cursor>,
        limit: usize,
    ) -> Result<Vec<(Cursor, PoolEvent)>, SourceError> {
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(SourceError::Transient("index restarting".into()));
        }
        self.inner.page(pool, after, limit).await
    }

    async fn nullifier_spent(
        &self,
        pool: &PoolId,
        nullifier: &Nullifier,
    ) -> Result<bool, SourceError> {
        self.inner.nullifier_spent(pool, nullifier).await
    }
}

#[tokio::test]
async fn transient_source_failures_are_retried() {
    let h = build_history();
    let flaky = FlakySource {
        inner: &h.index,
        failures: std::cell::Cell::new(2),
    };

    let mut scanner = NoteScanner::new(h.sui.id(), h.owner.clone());
    scanner.sync(&flaky).await.unwrap();
    scanner.verify_chain_root(&h.sui.current_root()).unwrap();
}

#[tokio::test]
async fn permanent_source_failures_surface() {
    struct Broken;

    impl EventSource for Broken {
        async fn page(
            &self,
            _pool: &PoolId,
            _after: Option<Cursor>,
            _limit: usize,
        ) -> Result<Vec<(Cursor, PoolEvent)>, SourceError> {
            Err(SourceError::Permanent("no such pool".into()))
        }

        async fn nullifier_spent(
            &self,
            _pool: &PoolId,
            _nullifier: &Nullifier,
        ) -> Result<bool, SourceError> {
            Err(SourceError::Permanent("no such pool".into()))
        }
    }

    let mut rng = ChaCha20Rng::seed_from_u64(400);
    let owner = SpendingKey::random(&mut rng);
    let mut scanner = NoteScanner::new(PoolId([9u8; 32]), owner);

    let err = scanner.sync(&Broken).await.unwrap_err();
    assert_eq!(
        err,
        SyncError::Source(SourceError::Permanent("no such pool".into()))
    );
}

#[tokio::test]
async fn divergent_root_is_reported_with_rescan_hint() {
    let h = build_history();

    let mut scanner = NoteScanner::new(h.sui.id(), h.owner.clone());
    scanner.sync(&h.index).await.unwrap();

    let err = scanner.verify_chain_root(&[9u8; 32]).unwrap_err();
    assert_eq!(err, SyncError::RootDivergence);
}

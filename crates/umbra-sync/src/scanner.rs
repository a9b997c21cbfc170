//! event-driven note scanner
//!
//! streams a pool's event history, rebuilds the commitment tree, trial
//! decrypts every blob with the owner's viewing key and keeps the books on
//! which notes are spendable. runs single-threaded per owner; dropping the
//! future mid-pagination is safe, everything up to the last acknowledged
//! cursor is retained.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use x25519_dalek::StaticSecret;

use umbra_core::field::{fr_from_bytes, fr_to_bytes};
use umbra_core::keys::NullifyingKey;
use umbra_core::{
    Commitment, FieldBytes, Note, NoteCiphertext, Nullifier, SpendingKey, TokenId,
};
use umbra_pool::{PoolEvent, PoolId};

use crate::error::SyncError;
use crate::mirror::{MerklePath, TreeMirror};
use crate::source::{Cursor, EventSource};

/// events fetched per request
const PAGE_SIZE: usize = 256;
/// transient source failures tolerated per page
const MAX_RETRIES: u32 = 3;

/// a note the owner can decrypt, pinned to its tree position
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedNote {
    pub note: Note,
    pub position: u64,
    pub commitment: Commitment,
}

/// an owned note that is still unspent, with everything a prover needs
#[derive(Clone, Debug)]
pub struct SpendableNote {
    pub note: Note,
    pub position: u64,
    pub nullifier: Nullifier,
    pub path: MerklePath,
}

/// serialisable scan state for cursor durability across restarts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScannerSnapshot {
    cursor: Option<Cursor>,
    leaves: Vec<FieldBytes>,
    owned: Vec<OwnedNoteRecord>,
    spent: Vec<FieldBytes>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct OwnedNoteRecord {
    position: u64,
    nsk: FieldBytes,
    token: FieldBytes,
    value: u64,
    random: FieldBytes,
}

/// per-owner, per-pool note discovery pipeline
pub struct NoteScanner {
    pool: PoolId,
    spending_key: SpendingKey,
    viewing_secret: StaticSecret,
    nullifying_key: NullifyingKey,
    mirror: TreeMirror,
    owned: BTreeMap<u64, OwnedNote>,
    /// nullifiers observed on-chain so far
    spent: HashSet<FieldBytes>,
    cursor: Option<Cursor>,
}

impl NoteScanner {
    pub fn new(pool: PoolId, spending_key: SpendingKey) -> Self {
        let viewing_secret = spending_key.viewing_secret();
        let nullifying_key = spending_key.nullifying_key();
        Self {
            pool,
            spending_key,
            viewing_secret,
            nullifying_key,
            mirror: TreeMirror::new(),
            owned: BTreeMap::new(),
            spent: HashSet::new(),
            cursor: None,
        }
    }

    pub fn pool(&self) -> PoolId {
        self.pool
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    /// root of the reconstructed tree; must track the chain root exactly
    pub fn root(&self) -> FieldBytes {
        self.mirror.root()
    }

    /// compare the reconstruction against the chain's current root
    pub fn verify_chain_root(&self, chain_root: &FieldBytes) -> Result<(), SyncError> {
        if self.root() != *chain_root {
            return Err(SyncError::RootDivergence);
        }
        Ok(())
    }

    /// pull and apply everything newer than the stored cursor
    pub async fn sync<S: EventSource>(&mut self, source: &S) -> Result<usize, SyncError> {
        let mut ingested = 0;
        loop {
            let page = self.fetch_page(source).await?;
            if page.is_empty() {
                break;
            }
            for (cursor, event) in page {
                self.apply(&event)?;
                self.cursor = Some(cursor);
                ingested += 1;
            }
        }
        info!(
            owned = self.owned.len(),
            leaves = self.mirror.len(),
            "scan caught up"
        );
        Ok(ingested)
    }

    async fn fetch_page<S: EventSource>(
        &self,
        source: &S,
    ) -> Result<Vec<(Cursor, PoolEvent)>, SyncError> {
        let mut attempts = 0;
        loop {
            match source.page(&self.pool, self.cursor, PAGE_SIZE).await {
                Ok(page) => {
                    debug!(events = page.len(), "fetched event page");
                    return Ok(page);
                }
                Err(err) if err.is_retryable() && attempts < MAX_RETRIES => {
                    attempts += 1;
                    warn!(%err, attempts, "retrying event page");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn apply(&mut self, event: &PoolEvent) -> Result<(), SyncError> {
        match event {
            PoolEvent::Shield(e) if e.pool == self.pool => {
                self.ingest_output(e.position, e.commitment, &e.encrypted_note)?;
            }
            PoolEvent::Transfer(e) if e.pool == self.pool => {
                for nullifier in &e.input_nullifiers {
                    self.spent.insert(nullifier.to_bytes());
                }
                for i in 0..2 {
                    self.ingest_output(
                        e.output_positions[i],
                        e.output_commitments[i],
                        &e.encrypted_notes[i],
                    )?;
                }
            }
            PoolEvent::Unshield(e) if e.pool == self.pool => {
                self.spent.insert(e.nullifier.to_bytes());
            }
            PoolEvent::Swap(e) => {
                if e.pool_in == self.pool {
                    for nullifier in &e.input_nullifiers {
                        self.spent.insert(nullifier.to_bytes());
                    }
                    self.ingest_output(
                        e.change_position,
                        e.change_commitment,
                        &e.encrypted_notes[1],
                    )?;
                }
                if e.pool_out == self.pool {
                    self.ingest_output(
                        e.output_position,
                        e.output_commitment,
                        &e.encrypted_notes[0],
                    )?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn ingest_output(
        &mut self,
        position: u64,
        commitment: Commitment,
        blob: &[u8],
    ) -> Result<(), SyncError> {
        self.mirror.insert_at(position, commitment)?;

        let Ok(ciphertext) = NoteCiphertext::from_bytes(blob) else {
            return Ok(());
        };
        let Some(note) = ciphertext.try_decrypt(&self.viewing_secret) else {
            return Ok(());
        };
        // a decryptable blob must reproduce the on-chain commitment, or it
        // is junk addressed to us and not a spendable note
        if note.commitment() != commitment {
            warn!(position, "decrypted note does not match its commitment");
            return Ok(());
        }

        debug!(position, value = note.value, "claimed note");
        self.owned.insert(
            position,
            OwnedNote {
                note,
                position,
                commitment,
            },
        );
        Ok(())
    }

    /// all notes the viewing key could open, spent or not
    pub fn owned_notes(&self) -> impl Iterator<Item = &OwnedNote> {
        self.owned.values()
    }

    /// locally visible unspent balance
    pub fn balance(&self) -> u64 {
        self.unspent_notes().map(|n| n.note.value).sum()
    }

    /// value of owned notes whose nullifiers have been published
    pub fn spent_balance(&self) -> u64 {
        self.owned
            .values()
            .filter(|n| self.is_locally_spent(n.position))
            .map(|n| n.note.value)
            .sum()
    }

    /// owned notes not yet seen spent on-chain
    pub fn unspent_notes(&self) -> impl Iterator<Item = &OwnedNote> {
        self.owned
            .values()
            .filter(|n| !self.is_locally_spent(n.position))
    }

    fn is_locally_spent(&self, position: u64) -> bool {
        let nullifier = Nullifier::derive(&self.nullifying_key, position);
        self.spent.contains(&nullifier.to_bytes())
    }

    /// owned notes that are unspent both locally and on-chain, each with
    /// its sibling path for the prover
    pub async fn spendable_notes<S: EventSource>(
        &self,
        source: &S,
    ) -> Result<Vec<SpendableNote>, SyncError> {
        let mut spendable = Vec::new();
        for owned in self.owned.values() {
            let nullifier = Nullifier::derive(&self.nullifying_key, owned.position);
            if self.spent.contains(&nullifier.to_bytes()) {
                continue;
            }
            // catch spends this scanner was only a counterparty to
            if source.nullifier_spent(&self.pool, &nullifier).await? {
                continue;
            }
            let path = self.mirror.prove(owned.position)?;
            spendable.push(SpendableNote {
                note: owned.note.clone(),
                position: owned.position,
                nullifier,
                path,
            });
        }
        Ok(spendable)
    }

    /// forget everything and prepare for a rescan from genesis
    pub fn reset(&mut self) {
        self.mirror = TreeMirror::new();
        self.owned.clear();
        self.spent.clear();
        self.cursor = None;
    }

    /// capture scan state; refused while the mirror has a gap, because the
    /// cursor would already be past the missing events
    pub fn snapshot(&self) -> Result<ScannerSnapshot, SyncError> {
        if let Some(gap) = self.mirror.gap() {
            return Err(SyncError::GapOpen(gap));
        }
        Ok(ScannerSnapshot {
            cursor: self.cursor,
            leaves: self.mirror.leaves().iter().map(|c| c.to_bytes()).collect(),
            owned: self
                .owned
                .values()
                .map(|o| OwnedNoteRecord {
                    position: o.position,
                    nsk: fr_to_bytes(&o.note.nsk),
                    token: o.note.token.to_bytes(),
                    value: o.note.value,
                    random: fr_to_bytes(&o.note.random),
                })
                .collect(),
            spent: self.spent.iter().copied().collect(),
        })
    }

    /// resume from a snapshot taken with the same spending key
    pub fn restore(
        pool: PoolId,
        spending_key: SpendingKey,
        snapshot: ScannerSnapshot,
    ) -> Result<Self, SyncError> {
        let mut scanner = Self::new(pool, spending_key);
        for (position, bytes) in snapshot.leaves.iter().enumerate() {
            scanner
                .mirror
                .insert_at(position as u64, Commitment::from_bytes(*bytes))?;
        }
        for record in snapshot.owned {
            let note = Note {
                nsk: fr_from_bytes(&record.nsk),
                token: TokenId::from_bytes(record.token),
                value: record.value,
                random: fr_from_bytes(&record.random),
            };
            let commitment = note.commitment();
            scanner.owned.insert(
                record.position,
                OwnedNote {
                    note,
                    position: record.position,
                    commitment,
                },
            );
        }
        scanner.spent = snapshot.spent.into_iter().collect();
        scanner.cursor = snapshot.cursor;
        Ok(scanner)
    }

    /// the spending key this scanner discovers notes for
    pub fn spending_key(&self) -> &SpendingKey {
        &self.spending_key
    }
}

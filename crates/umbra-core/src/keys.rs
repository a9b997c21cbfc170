//! key hierarchy
//!
//! a single field-valued spending key roots everything:
//!
//! ```text
//! spending_key ──P2(·,1)──► nullifying_key
//!       │                        │
//!       └────────P2──────────────┴──► master public key (mpk)
//!       │
//!       └──blake3──► x25519 viewing secret (decrypt-only access)
//! ```
//!
//! notes are bound to an owner through `nsk = P2(mpk, random)`; the viewing
//! keypair lets a wallet scan incoming notes without being able to spend

use ark_bn254::Fr;
use rand::{CryptoRng, RngCore};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::field::{canonical_bytes, fr_from_bytes, fr_from_u64, fr_to_bytes, FieldBytes};
use crate::poseidon::hash2;
use crate::VIEWING_KEY_DOMAIN;

/// root secret of the key hierarchy
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SpendingKey {
    secret: FieldBytes,
}

impl SpendingKey {
    /// canonical key from arbitrary 32 bytes (reduced mod r)
    pub fn from_bytes(bytes: FieldBytes) -> Self {
        Self {
            secret: canonical_bytes(&bytes),
        }
    }

    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    fn secret_field(&self) -> Fr {
        fr_from_bytes(&self.secret)
    }

    pub fn nullifying_key(&self) -> NullifyingKey {
        NullifyingKey(hash2(self.secret_field(), fr_from_u64(1)))
    }

    pub fn master_public_key(&self) -> MasterPublicKey {
        MasterPublicKey(hash2(self.secret_field(), self.nullifying_key().0))
    }

    /// x25519 secret granting decrypt-only access to incoming notes
    pub fn viewing_secret(&self) -> StaticSecret {
        let mut hasher = blake3::Hasher::new();
        hasher.update(VIEWING_KEY_DOMAIN);
        hasher.update(&self.secret);
        StaticSecret::from(*hasher.finalize().as_bytes())
    }

    /// public half of the viewing keypair, shared with senders
    pub fn viewing_public(&self) -> PublicKey {
        PublicKey::from(&self.viewing_secret())
    }
}

/// secret key nullifiers are derived from
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NullifyingKey(pub(crate) Fr);

impl NullifyingKey {
    pub fn to_field(&self) -> Fr {
        self.0
    }

    pub fn to_bytes(&self) -> FieldBytes {
        fr_to_bytes(&self.0)
    }
}

/// public key notes are addressed to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MasterPublicKey(pub(crate) Fr);

impl MasterPublicKey {
    pub fn to_field(&self) -> Fr {
        self.0
    }

    pub fn to_bytes(&self) -> FieldBytes {
        fr_to_bytes(&self.0)
    }

    pub fn from_bytes(bytes: &FieldBytes) -> Self {
        Self(fr_from_bytes(bytes))
    }

    /// per-note secret, derived by the sender from a fresh blinding factor
    pub fn note_secret(&self, random: Fr) -> Fr {
        hash2(self.0, random)
    }
}

//! umbra shielded pool primitives
//!
//! value inside the pool exists only as poseidon commitments over the bn254
//! scalar field. this crate holds everything both sides of the protocol must
//! agree on bit-for-bit:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        UMBRA CORE                        │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  spending_key ──► nullifying_key ──► master public key   │
//! │       │                                     │            │
//! │       └──► x25519 viewing keypair           ▼            │
//! │                               nsk = P2(mpk, random)      │
//! │                                                          │
//! │  commitment = P3(nsk, token, value)   (tree leaf)        │
//! │  nullifier  = P2(nk, leaf_index)      (spend marker)     │
//! │                                                          │
//! │  note blob  = epk ‖ nonce ‖ chacha20poly1305(note)       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! the pool state machine and the client scanner both link against these
//! definitions; any divergence breaks root agreement between them.

pub mod encryption;
pub mod error;
pub mod field;
pub mod keys;
pub mod note;
pub mod nullifier;
pub mod poseidon;
pub mod value;

pub use encryption::{NoteCiphertext, NOTE_CIPHERTEXT_MIN_LEN};
pub use error::CryptoError;
pub use field::{fr_from_bytes, fr_from_u64, fr_to_bytes, FieldBytes};
pub use keys::{MasterPublicKey, NullifyingKey, SpendingKey};
pub use note::{Commitment, Note};
pub use nullifier::Nullifier;
pub use value::{Address, Coin, TokenId};

/// domain separator for the x25519 viewing secret
pub const VIEWING_KEY_DOMAIN: &[u8] = b"umbra.viewing-key.v1";
/// domain separator for the note encryption key
pub const NOTE_KEY_DOMAIN: &[u8] = b"umbra.note-key.v1";
/// domain separator for the note encryption nonce
pub const NOTE_NONCE_DOMAIN: &[u8] = b"umbra.note-nonce.v1";

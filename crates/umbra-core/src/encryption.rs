//! note encryption for recipients
//!
//! the sender draws an ephemeral x25519 keypair, runs diffie-hellman against
//! the recipient's viewing public key and encrypts the note plaintext with
//! chacha20-poly1305 under a blake3-derived key. the nonce is derived from
//! the ephemeral public key. recipients trial-decrypt every blob; a failed
//! authentication tag just means the note is not theirs.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::{CryptoRng, RngCore};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::error::CryptoError;
use crate::field::{fr_from_bytes, fr_to_bytes};
use crate::note::Note;
use crate::value::TokenId;
use crate::{NOTE_KEY_DOMAIN, NOTE_NONCE_DOMAIN};

/// nsk ‖ token ‖ value ‖ random
const PLAINTEXT_LEN: usize = 32 + 32 + 8 + 32;
/// poly1305 authentication tag
const TAG_LEN: usize = 16;
/// shortest parseable blob: ephemeral pk, nonce, empty ciphertext, tag
pub const NOTE_CIPHERTEXT_MIN_LEN: usize = 32 + 12 + TAG_LEN;

/// encrypted note blob as carried by pool events
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteCiphertext {
    pub ephemeral_pk: [u8; 32],
    pub nonce: [u8; 12],
    pub ciphertext: Vec<u8>,
}

impl NoteCiphertext {
    /// encrypt a note to the recipient's viewing public key
    pub fn encrypt<R: RngCore + CryptoRng>(
        note: &Note,
        recipient: &PublicKey,
        rng: &mut R,
    ) -> Result<Self, CryptoError> {
        let ephemeral_secret = EphemeralSecret::random_from_rng(&mut *rng);
        let ephemeral_pk = PublicKey::from(&ephemeral_secret);
        let shared = ephemeral_secret.diffie_hellman(recipient);

        let key = derive_key(shared.as_bytes(), ephemeral_pk.as_bytes());
        let nonce = derive_nonce(ephemeral_pk.as_bytes());

        let cipher = ChaCha20Poly1305::new_from_slice(&key)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext(note).as_slice())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(Self {
            ephemeral_pk: *ephemeral_pk.as_bytes(),
            nonce,
            ciphertext,
        })
    }

    /// attempt decryption with a viewing secret; `None` means not ours
    pub fn try_decrypt(&self, viewing_secret: &StaticSecret) -> Option<Note> {
        let ephemeral_pk = PublicKey::from(self.ephemeral_pk);
        let shared = viewing_secret.diffie_hellman(&ephemeral_pk);

        let key = derive_key(shared.as_bytes(), &self.ephemeral_pk);
        let cipher = ChaCha20Poly1305::new_from_slice(&key).ok()?;
        let opened = cipher
            .decrypt(Nonce::from_slice(&self.nonce), self.ciphertext.as_slice())
            .ok()?;

        parse_plaintext(&opened)
    }

    /// `ephemeral_pk ‖ nonce ‖ ciphertext‖tag`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + 12 + self.ciphertext.len());
        out.extend_from_slice(&self.ephemeral_pk);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < NOTE_CIPHERTEXT_MIN_LEN {
            return Err(CryptoError::MalformedCiphertext);
        }
        let mut ephemeral_pk = [0u8; 32];
        ephemeral_pk.copy_from_slice(&bytes[..32]);
        let mut nonce = [0u8; 12];
        nonce.copy_from_slice(&bytes[32..44]);
        Ok(Self {
            ephemeral_pk,
            nonce,
            ciphertext: bytes[44..].to_vec(),
        })
    }
}

fn plaintext(note: &Note) -> Vec<u8> {
    let mut out = Vec::with_capacity(PLAINTEXT_LEN);
    out.extend_from_slice(&fr_to_bytes(&note.nsk));
    out.extend_from_slice(&note.token.to_bytes());
    out.extend_from_slice(&note.value.to_le_bytes());
    out.extend_from_slice(&fr_to_bytes(&note.random));
    out
}

fn parse_plaintext(bytes: &[u8]) -> Option<Note> {
    if bytes.len() != PLAINTEXT_LEN {
        return None;
    }
    let nsk = fr_from_bytes(&bytes[..32].try_into().ok()?);
    let token = TokenId::from_bytes(bytes[32..64].try_into().ok()?);
    let value = u64::from_le_bytes(bytes[64..72].try_into().ok()?);
    let random = fr_from_bytes(&bytes[72..104].try_into().ok()?);
    Some(Note {
        nsk,
        token,
        value,
        random,
    })
}

fn derive_key(shared_secret: &[u8], ephemeral_pk: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(NOTE_KEY_DOMAIN);
    hasher.update(shared_secret);
    hasher.update(ephemeral_pk);
    *hasher.finalize().as_bytes()
}

fn derive_nonce(ephemeral_pk: &[u8]) -> [u8; 12] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(NOTE_NONCE_DOMAIN);
    hasher.update(ephemeral_pk);
    let digest = hasher.finalize();
    let mut nonce = [0u8; 12];
    nonce.copy_from_slice(&digest.as_bytes()[..12]);
    nonce
}

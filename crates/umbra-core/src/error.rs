//! error types for the primitives layer

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("encryption failed")]
    EncryptionFailed,

    #[error("ciphertext too short to carry a note")]
    MalformedCiphertext,
}

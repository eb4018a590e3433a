//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key file could not be read or written
    #[error("Key I/O failed for {path}: {source}")]
    KeyIo {
        /// Path of the key file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No key registered for the validator
    #[error("No key for validator {0}")]
    UnknownValidator(u16),

    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Hex text could not be decoded
    #[error("Invalid hex encoding: {0}")]
    InvalidEncoding(String),

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,
}

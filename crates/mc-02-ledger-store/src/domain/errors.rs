//! # Domain Errors
//!
//! Error types for the Ledger Store.

use shared_crypto::CryptoError;
use shared_types::FieldError;
use std::fmt;
use thiserror::Error;

/// Why a block cannot sit at its position in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultReason {
    /// Stored record failed its checksum or could not be decoded.
    CorruptRecord,
    /// `index` is not the next position.
    IndexOutOfSequence { expected: u64 },
    /// `previous_hash` does not match the recomputed predecessor fingerprint.
    BrokenLink,
    /// `block_hash` does not match the recomputed fingerprint.
    FingerprintMismatch,
    /// Signature does not verify against the declared validator.
    InvalidSignature,
    /// A transaction repeats a `data_hash` already on the chain.
    DuplicateRecord { data_hash: String },
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultReason::CorruptRecord => write!(f, "corrupt record"),
            FaultReason::IndexOutOfSequence { expected } => {
                write!(f, "index out of sequence (expected {expected})")
            }
            FaultReason::BrokenLink => write!(f, "previous_hash does not link to predecessor"),
            FaultReason::FingerprintMismatch => write!(f, "block_hash does not match content"),
            FaultReason::InvalidSignature => write!(f, "validator signature invalid"),
            FaultReason::DuplicateRecord { data_hash } => {
                write!(f, "duplicate record {data_hash}")
            }
        }
    }
}

/// First inconsistency found in a chain, with the offending index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chain invalid at block {index}: {reason}")]
pub struct ChainFault {
    pub index: u64,
    pub reason: FaultReason,
}

impl ChainFault {
    pub fn new(index: u64, reason: FaultReason) -> Self {
        Self { index, reason }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Ledger file could not be opened, read or written.
    #[error("Ledger I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Block could not be serialized for the log.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A complete record failed its checksum when the log was loaded.
    #[error("Corrupt record at position {position}")]
    CorruptRecord { position: u64 },

    /// Signing failed (missing or unreadable key).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Block carries a field the ledger cannot store.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Block violates a chain rule.
    #[error(transparent)]
    Fault(#[from] ChainFault),
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

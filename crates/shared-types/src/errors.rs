//! # Error Types
//!
//! Field-level errors shared by every crate that builds or decodes blocks.

use thiserror::Error;

/// A block or transaction field that cannot be carried safely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Block exceeds the transaction limit.
    #[error("Too many transactions: {count} exceeds maximum {max}")]
    TooManyTransactions { count: usize, max: usize },

    /// Field exceeds its fixed width.
    #[error("Field {field} too long: {len} bytes, maximum {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Field must hold a content fingerprint.
    #[error("Field {field} must be 64 lowercase hex characters")]
    NotAFingerprint { field: &'static str },

    /// Field contains a delimiter reserved by the wire format.
    #[error("Field {field} contains a reserved character")]
    ReservedCharacter { field: &'static str },
}

//! Error types for the wire protocol.

use shared_types::FieldError;
use thiserror::Error;

/// Block text that cannot be decoded, or a block that cannot be encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Empty block encoding")]
    Empty,

    #[error("Header has {found} fields, expected {expected}")]
    HeaderFieldCount { expected: usize, found: usize },

    #[error("Field {field} is not a valid number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Declared {declared} transactions, maximum is {max}")]
    TooManyTransactions { declared: usize, max: usize },

    #[error("Transaction record {position} has {found} fields, expected {expected}")]
    TransactionFieldCount {
        position: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unexpected record: {0:?}")]
    UnexpectedRecord(String),

    #[error("Declared {declared} transactions, found {found}")]
    TransactionCountMismatch { declared: usize, found: usize },

    #[error("Missing END_BLOCK terminator")]
    MissingTerminator,

    #[error("Data after END_BLOCK terminator")]
    TrailingData,

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// A protocol line that cannot be turned into a [`crate::Message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Keyword is not part of the protocol.
    #[error("Unknown message kind: {0:?}")]
    UnknownKind(String),

    /// Numeric payload did not parse.
    #[error("{kind} carries an invalid number: {value:?}")]
    InvalidNumber { kind: &'static str, value: String },

    /// Vote payload was neither APPROVE nor REJECT.
    #[error("Invalid vote: {0:?}")]
    InvalidVote(String),

    /// Embedded block failed to decode.
    #[error("{kind} carries a malformed block: {source}")]
    MalformedBlock {
        kind: &'static str,
        #[source]
        source: CodecError,
    },
}

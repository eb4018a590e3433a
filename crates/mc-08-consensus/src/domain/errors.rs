//! Error types for the consensus subsystem.

use mc_02_ledger_store::{ChainFault, LedgerError};
use mc_05_wire_protocol::CodecError;
use thiserror::Error;

/// Failures of local consensus operations.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("Proposal for block {index} still outstanding")]
    AlreadyProposing { index: u64 },

    #[error("Block does not extend the local chain: {0}")]
    NotAnExtension(#[from] ChainFault),

    #[error("Encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;

/// Why a peer's proposal earned a `REJECT` vote.
///
/// Variants are listed in the order the checks run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("proposal could not be decoded: {0}")]
    Malformed(String),

    #[error("node is syncing")]
    Syncing,

    #[error("own proposal outstanding")]
    ProposalOutstanding,

    #[error("record {data_hash} already on chain")]
    DuplicateRecord { data_hash: String },

    #[error("block_hash does not match content")]
    FingerprintMismatch,

    #[error("validator signature invalid")]
    InvalidSignature,

    #[error("index {found} is not the next index {expected}")]
    IndexMismatch { expected: u64, found: u64 },

    #[error("previous_hash does not match local last block")]
    PreviousHashMismatch,

    #[error("local chain invalid: {0}")]
    LocalChainInvalid(String),
}

//! # Inbound Ports (Driving Ports)
//!
//! The ledger operations consumed by consensus, chain sync and the control
//! shell. Every call is atomic with respect to every other call.

use shared_types::{Block, ValidatorId};

use crate::domain::errors::{ChainFault, LedgerResult};

/// Primary API of the Ledger Store.
pub trait LedgerApi: Send + Sync {
    /// Number of blocks in the chain.
    fn height(&self) -> u64;

    /// Last block, or `None` for an empty chain.
    fn last_block(&self) -> Option<Block>;

    /// Block at `index`, or `None`.
    fn block_by_index(&self, index: u64) -> Option<Block>;

    /// True when any transaction on the chain carries `data_hash`.
    fn transaction_hash_exists(&self, data_hash: &str) -> bool;

    /// Append without chain checks. Flushed to the log before returning.
    fn append(&self, block: &Block) -> LedgerResult<()>;

    /// Check that `block` would be a valid next block.
    fn check_extension(&self, block: &Block) -> Result<(), ChainFault>;

    /// Check and append as one atomic step.
    fn try_extend(&self, block: &Block) -> LedgerResult<()>;

    /// Re-read the persisted chain and verify it from genesis.
    ///
    /// Returns the verified height, or [`crate::LedgerError::Fault`] naming the
    /// first offending index.
    fn verify_chain(&self) -> LedgerResult<u64>;

    /// Recompute one block's fingerprint and verify its signature.
    fn verify_block(&self, block: &Block) -> Result<(), ChainFault>;

    /// Fingerprint and sign `block` as `validator`.
    fn seal_and_sign(&self, block: &mut Block, validator: ValidatorId) -> LedgerResult<()>;
}

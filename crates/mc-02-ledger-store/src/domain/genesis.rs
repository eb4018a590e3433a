//! Deterministic genesis block.
//!
//! Genesis content is fixed, so every node computes the same genesis
//! fingerprint and block 1 links identically everywhere. Only the signature
//! differs: each node signs genesis with its own key.

use shared_crypto::AuthorityKeys;
use shared_types::{sha256_hex, Block, Transaction, ValidatorId, GENESIS_PREVIOUS_HASH};

use super::errors::LedgerResult;

/// Canonical genesis timestamp (2024-01-01T00:00:00Z).
pub const GENESIS_TIMESTAMP: i64 = 1_704_067_200;

const GENESIS_PATIENT: &str = "GENESIS";
const GENESIS_DOCTOR: &str = "SYSTEM";
const GENESIS_POINTER: &str = "genesis";

/// The single well-known genesis transaction.
pub fn genesis_transaction() -> Transaction {
    Transaction::new(
        GENESIS_PATIENT,
        GENESIS_DOCTOR,
        sha256_hex(GENESIS_PATIENT.as_bytes()),
        GENESIS_POINTER,
        GENESIS_TIMESTAMP,
    )
}

/// Build and sign the genesis block as `validator`.
///
/// Fails if the validator's private key is unavailable.
pub fn build_genesis(validator: ValidatorId, keys: &dyn AuthorityKeys) -> LedgerResult<Block> {
    let mut block = Block::new(0, GENESIS_TIMESTAMP, GENESIS_PREVIOUS_HASH, validator);
    block.add_transaction(genesis_transaction())?;
    block.seal();
    block.validator_signature = keys.sign(block.block_hash.as_bytes(), validator)?;
    Ok(block)
}

//! # Core Domain Entities
//!
//! Defines the ledger entities shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `Transaction`
//! - **Authority**: `ValidatorId`
//!
//! Every text field travels inside the `|`/`~` delimited wire format and the
//! fingerprint pre-image, so the reserved characters are rejected up front by
//! [`Transaction::validate`] and [`Block::validate_fields`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::FieldError;
use crate::fingerprint::{block_fingerprint, is_fingerprint};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum number of transactions carried by one block.
pub const MAX_TRANSACTIONS: usize = 5;

/// Maximum length of `patient_id` and `doctor_id`.
pub const MAX_ID_LEN: usize = 31;

/// Maximum length of `data_pointer`.
pub const MAX_POINTER_LEN: usize = 127;

/// Maximum length of any hash or signature text field.
pub const MAX_DIGEST_LEN: usize = 512;

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Characters reserved by the wire codec and the line framing.
pub const RESERVED_CHARS: [char; 4] = ['|', '~', '\r', '\n'];

/// Unix timestamp in seconds.
pub type Timestamp = i64;

/// Hex-encoded block fingerprint.
pub type BlockHash = String;

// =============================================================================
// CLUSTER A: AUTHORITY
// =============================================================================

/// Identity of a validator: the port its node listens on.
///
/// The port doubles as the key-pair address, so a block's
/// `validator` field is all a verifier needs to locate the public key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ValidatorId(pub u16);

impl ValidatorId {
    /// Returns the underlying port.
    pub fn port(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for ValidatorId {
    fn from(port: u16) -> Self {
        Self(port)
    }
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// Pseudonymized pointer to an off-chain medical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Pseudonymous patient identifier.
    pub patient_id: String,
    /// Identifier of the authoring doctor.
    pub doctor_id: String,
    /// Content fingerprint of the off-chain payload, 64 lowercase hex chars.
    pub data_hash: String,
    /// Locator of the off-chain payload.
    pub data_pointer: String,
    /// Time the record was submitted.
    pub timestamp: Timestamp,
}

impl Transaction {
    /// Create a new transaction.
    pub fn new(
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        data_hash: impl Into<String>,
        data_pointer: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            data_hash: data_hash.into(),
            data_pointer: data_pointer.into(),
            timestamp,
        }
    }

    /// Check field lengths, reserved characters and the `data_hash` format.
    pub fn validate(&self) -> Result<(), FieldError> {
        check_field("patient_id", &self.patient_id, MAX_ID_LEN)?;
        check_field("doctor_id", &self.doctor_id, MAX_ID_LEN)?;
        if !is_fingerprint(&self.data_hash) {
            return Err(FieldError::NotAFingerprint { field: "data_hash" });
        }
        check_field("data_pointer", &self.data_pointer, MAX_POINTER_LEN)?;
        Ok(())
    }
}

/// A block of the authority chain.
///
/// `transaction_count` is not stored separately: it is always
/// `transactions.len()`, which keeps the two from ever disagreeing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, starting at 0.
    pub index: u64,
    /// Time the block was built.
    pub timestamp: Timestamp,
    /// Fingerprint of the predecessor, `"0"` for genesis.
    pub previous_hash: BlockHash,
    /// Fingerprint of this block's content.
    pub block_hash: BlockHash,
    /// Signer of the block.
    pub validator: ValidatorId,
    /// Hex-encoded signature over `block_hash`.
    pub validator_signature: String,
    /// Ordered transactions, at most [`MAX_TRANSACTIONS`].
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create an unsealed block with no transactions.
    pub fn new(
        index: u64,
        timestamp: Timestamp,
        previous_hash: impl Into<BlockHash>,
        validator: ValidatorId,
    ) -> Self {
        Self {
            index,
            timestamp,
            previous_hash: previous_hash.into(),
            block_hash: String::new(),
            validator,
            validator_signature: String::new(),
            transactions: Vec::new(),
        }
    }

    /// Append a transaction, refusing to exceed [`MAX_TRANSACTIONS`].
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), FieldError> {
        if self.transactions.len() >= MAX_TRANSACTIONS {
            return Err(FieldError::TooManyTransactions {
                count: self.transactions.len() + 1,
                max: MAX_TRANSACTIONS,
            });
        }
        self.transactions.push(tx);
        Ok(())
    }

    /// Number of transactions in the block.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Recompute the canonical fingerprint from the block's content.
    pub fn fingerprint(&self) -> BlockHash {
        block_fingerprint(self)
    }

    /// Store the freshly computed fingerprint in `block_hash`.
    pub fn seal(&mut self) -> &BlockHash {
        self.block_hash = self.fingerprint();
        &self.block_hash
    }

    /// True when `block_hash` matches the recomputed fingerprint.
    pub fn has_valid_fingerprint(&self) -> bool {
        self.block_hash == self.fingerprint()
    }

    /// True for the chain's first block.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// True when any transaction carries `data_hash`.
    pub fn contains_data_hash(&self, data_hash: &str) -> bool {
        self.transactions.iter().any(|tx| tx.data_hash == data_hash)
    }

    /// Check every text field against the codec's constraints.
    pub fn validate_fields(&self) -> Result<(), FieldError> {
        if self.transactions.len() > MAX_TRANSACTIONS {
            return Err(FieldError::TooManyTransactions {
                count: self.transactions.len(),
                max: MAX_TRANSACTIONS,
            });
        }
        check_field("previous_hash", &self.previous_hash, MAX_DIGEST_LEN)?;
        check_field("block_hash", &self.block_hash, MAX_DIGEST_LEN)?;
        check_field(
            "validator_signature",
            &self.validator_signature,
            MAX_DIGEST_LEN,
        )?;
        self.transactions.iter().try_for_each(Transaction::validate)
    }
}

fn check_field(field: &'static str, value: &str, max: usize) -> Result<(), FieldError> {
    if value.len() > max {
        return Err(FieldError::FieldTooLong {
            field,
            len: value.len(),
            max,
        });
    }
    if value.contains(RESERVED_CHARS) {
        return Err(FieldError::ReservedCharacter { field });
    }
    Ok(())
}

//! Ordered checks a receiver runs on a peer's proposal.

use std::collections::HashSet;

use mc_02_ledger_store::{FaultReason, LedgerApi};
use shared_types::{Block, GENESIS_PREVIOUS_HASH};

use super::RejectReason;

/// Decide whether `block` deserves an `APPROVE`.
///
/// Checks run in a fixed order and the first failure wins:
/// syncing, own proposal outstanding, duplicate record, fingerprint,
/// signature, index, linkage, local chain verification.
pub fn evaluate_proposal<L>(
    block: &Block,
    syncing: bool,
    proposing: bool,
    ledger: &L,
) -> Result<(), RejectReason>
where
    L: LedgerApi + ?Sized,
{
    if syncing {
        return Err(RejectReason::Syncing);
    }
    // Approving a competitor for the same slot lets both reach majority.
    if proposing {
        return Err(RejectReason::ProposalOutstanding);
    }

    let mut in_block = HashSet::new();
    for tx in &block.transactions {
        if !in_block.insert(tx.data_hash.as_str()) || ledger.transaction_hash_exists(&tx.data_hash)
        {
            return Err(RejectReason::DuplicateRecord {
                data_hash: tx.data_hash.clone(),
            });
        }
    }

    if let Err(fault) = ledger.verify_block(block) {
        return Err(match fault.reason {
            FaultReason::FingerprintMismatch => RejectReason::FingerprintMismatch,
            _ => RejectReason::InvalidSignature,
        });
    }

    let expected = ledger.height();
    if block.index != expected {
        return Err(RejectReason::IndexMismatch {
            expected,
            found: block.index,
        });
    }

    let linked = match ledger.last_block() {
        Some(last) => block.previous_hash == last.fingerprint(),
        None => block.previous_hash == GENESIS_PREVIOUS_HASH,
    };
    if !linked {
        return Err(RejectReason::PreviousHashMismatch);
    }

    ledger
        .verify_chain()
        .map(|_| ())
        .map_err(|e| RejectReason::LocalChainInvalid(e.to_string()))
}

//! Chain rules.
//!
//! One rule set serves both directions: extending the chain by one block and
//! re-verifying the stored chain from genesis.

use std::collections::HashSet;

use shared_crypto::AuthorityKeys;
use shared_types::{Block, GENESIS_PREVIOUS_HASH};

use super::errors::{ChainFault, FaultReason};

/// Check that `block` may sit directly after `predecessor`.
///
/// `seen` holds every `data_hash` already on the chain. Checks run in order:
/// index, linkage against the recomputed predecessor fingerprint, content
/// fingerprint, signature, duplicate records.
pub fn check_successor(
    block: &Block,
    predecessor: Option<&Block>,
    seen: &HashSet<String>,
    keys: &dyn AuthorityKeys,
) -> Result<(), ChainFault> {
    let fault = |reason| ChainFault::new(block.index, reason);

    let expected = predecessor.map_or(0, |p| p.index + 1);
    if block.index != expected {
        return Err(fault(FaultReason::IndexOutOfSequence { expected }));
    }

    let linked = match predecessor {
        Some(p) => block.previous_hash == p.fingerprint(),
        None => block.previous_hash == GENESIS_PREVIOUS_HASH,
    };
    if !linked {
        return Err(fault(FaultReason::BrokenLink));
    }

    if !block.has_valid_fingerprint() {
        return Err(fault(FaultReason::FingerprintMismatch));
    }

    if !verify_signature(block, keys) {
        return Err(fault(FaultReason::InvalidSignature));
    }

    let mut local = HashSet::new();
    for tx in &block.transactions {
        if seen.contains(&tx.data_hash) || !local.insert(tx.data_hash.as_str()) {
            return Err(fault(FaultReason::DuplicateRecord {
                data_hash: tx.data_hash.clone(),
            }));
        }
    }
    Ok(())
}

/// True when the block's signature verifies against its declared validator.
pub fn verify_signature(block: &Block, keys: &dyn AuthorityKeys) -> bool {
    keys.verify(
        block.block_hash.as_bytes(),
        block.validator,
        &block.validator_signature,
    )
}

/// Verify a whole chain from genesis; returns its height.
pub fn verify_blocks<'a>(
    blocks: impl IntoIterator<Item = &'a Block>,
    keys: &dyn AuthorityKeys,
) -> Result<u64, ChainFault> {
    let mut seen = HashSet::new();
    let mut predecessor: Option<&Block> = None;
    let mut height = 0;
    for block in blocks {
        check_successor(block, predecessor, &seen, keys)?;
        seen.extend(block.transactions.iter().map(|tx| tx.data_hash.clone()));
        predecessor = Some(block);
        height += 1;
    }
    Ok(height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::genesis::build_genesis;
    use shared_crypto::InMemoryKeyStore;
    use shared_types::{Transaction, ValidatorId};

    const A: ValidatorId = ValidatorId(8001);

    fn keys() -> InMemoryKeyStore {
        InMemoryKeyStore::with_validators(&[A])
    }

    fn next(prev: &Block, data_hash: &str, keys: &InMemoryKeyStore) -> Block {
        let mut b = Block::new(prev.index + 1, 1_700_000_000, prev.fingerprint(), A);
        b.add_transaction(Transaction::new("P", "D", data_hash, "ptr", 1))
            .unwrap();
        b.seal();
        b.validator_signature = keys.sign(b.block_hash.as_bytes(), A).unwrap();
        b
    }

    fn chain(keys: &InMemoryKeyStore) -> Vec<Block> {
        let g = build_genesis(A, keys).unwrap();
        let b1 = next(&g, "h1", keys);
        let b2 = next(&b1, "h2", keys);
        vec![g, b1, b2]
    }

    #[test]
    fn test_valid_chain() {
        let keys = keys();
        assert_eq!(verify_blocks(&chain(&keys), &keys), Ok(3));
        assert_eq!(verify_blocks(&Vec::<Block>::new(), &keys), Ok(0));
    }

    #[test]
    fn test_tampered_payload_reported_at_index() {
        let keys = keys();
        let mut blocks = chain(&keys);
        blocks[1].transactions[0].data_pointer = "elsewhere".into();
        // Block 1's content changed: its own fingerprint fails first.
        let fault = verify_blocks(&blocks, &keys).unwrap_err();
        assert_eq!(fault, ChainFault::new(1, FaultReason::FingerprintMismatch));
    }

    #[test]
    fn test_forged_hash_breaks_successor_link() {
        let keys = keys();
        let mut blocks = chain(&keys);
        // Tamper and re-seal block 1 with a fresh signature: the stored hash now
        // matches, but block 2 links to the original fingerprint.
        blocks[1].transactions[0].data_pointer = "elsewhere".into();
        blocks[1].seal();
        blocks[1].validator_signature = keys.sign(blocks[1].block_hash.as_bytes(), A).unwrap();
        let fault = verify_blocks(&blocks, &keys).unwrap_err();
        assert_eq!(fault, ChainFault::new(2, FaultReason::BrokenLink));
    }

    #[test]
    fn test_rewritten_stored_hash_is_caught() {
        let keys = keys();
        let mut blocks = chain(&keys);
        // Stored hash of block 0 rewritten to whatever block 1 claims.
        blocks[0].block_hash = "f".repeat(64);
        blocks[1].previous_hash = "f".repeat(64);
        let fault = verify_blocks(&blocks, &keys).unwrap_err();
        assert_eq!(fault.index, 0);
    }

    #[test]
    fn test_bad_signature() {
        let keys = keys();
        let mut blocks = chain(&keys);
        blocks[2].validator_signature = "00".repeat(64);
        assert_eq!(
            verify_blocks(&blocks, &keys),
            Err(ChainFault::new(2, FaultReason::InvalidSignature))
        );
    }

    #[test]
    fn test_duplicate_record() {
        let keys = keys();
        let blocks = chain(&keys);
        let dup = next(&blocks[2], "h1", &keys);
        let seen: HashSet<String> = ["h1".to_string(), "h2".to_string()].into();
        assert!(matches!(
            check_successor(&dup, Some(&blocks[2]), &seen, &keys),
            Err(ChainFault {
                index: 3,
                reason: FaultReason::DuplicateRecord { .. }
            })
        ));
    }

    #[test]
    fn test_index_gap() {
        let keys = keys();
        let blocks = chain(&keys);
        let mut b = next(&blocks[2], "h9", &keys);
        b.index = 5;
        assert_eq!(
            check_successor(&b, Some(&blocks[2]), &HashSet::new(), &keys),
            Err(ChainFault::new(5, FaultReason::IndexOutOfSequence { expected: 3 }))
        );
    }
}

//! # Canonical Block Fingerprint
//!
//! SHA-256 over a `|` separated pre-image of the block's content:
//!
//! ```text
//! index|timestamp|previous_hash|tx_count
//!   |patient_id|doctor_id|data_hash|data_pointer|timestamp   (per transaction)
//! ```
//!
//! `block_hash` and `validator_signature` are excluded, so the fingerprint can
//! be recomputed from a stored block and compared against its stated hash.

use sha2::{Digest, Sha256};

use crate::entities::Block;

/// Length of a hex-encoded SHA-256 digest.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// True when `value` is a lowercase hex SHA-256 digest.
pub fn is_fingerprint(value: &str) -> bool {
    value.len() == FINGERPRINT_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compute the canonical fingerprint of `block`.
pub fn block_fingerprint(block: &Block) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        format!(
            "{}|{}|{}|{}",
            block.index,
            block.timestamp,
            block.previous_hash,
            block.transactions.len()
        )
        .as_bytes(),
    );
    for tx in &block.transactions {
        hasher.update(
            format!(
                "|{}|{}|{}|{}|{}",
                tx.patient_id, tx.doctor_id, tx.data_hash, tx.data_pointer, tx.timestamp
            )
            .as_bytes(),
        );
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Transaction, ValidatorId};

    fn block() -> Block {
        let mut b = Block::new(1, 1_700_000_000, "prev", ValidatorId(8001));
        b.add_transaction(Transaction::new("P1", "D1", "aa", "ptr", 5))
            .unwrap();
        b
    }

    #[test]
    fn test_is_fingerprint() {
        assert!(is_fingerprint(&sha256_hex(b"record")));
        assert!(!is_fingerprint("ABC"));
        assert!(!is_fingerprint(&"G".repeat(64)));
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        assert_eq!(block_fingerprint(&block()), block_fingerprint(&block()));
        assert_eq!(block_fingerprint(&block()).len(), 64);
    }

    #[test]
    fn test_fingerprint_ignores_hash_and_signature() {
        let plain = block();
        let mut signed = block();
        signed.block_hash = "anything".into();
        signed.validator_signature = "sig".into();
        signed.validator = ValidatorId(9000);
        assert_eq!(block_fingerprint(&plain), block_fingerprint(&signed));
    }

    #[test]
    fn test_fingerprint_covers_every_content_field() {
        let base = block_fingerprint(&block());

        let mut b = block();
        b.index = 2;
        assert_ne!(block_fingerprint(&b), base);

        let mut b = block();
        b.previous_hash = "other".into();
        assert_ne!(block_fingerprint(&b), base);

        let mut b = block();
        b.transactions[0].timestamp = 6;
        assert_ne!(block_fingerprint(&b), base);

        let mut b = block();
        b.transactions[0].doctor_id = "D2".into();
        assert_ne!(block_fingerprint(&b), base);
    }
}
